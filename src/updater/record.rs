//! 包分析结果，以及只能按流水线顺序填充字段的构建器

/// 单个包的分析结果。
///
/// 只能通过 [`PackageRecord::builder`] 构建，因此总满足
/// `updatable ⇒ installed ⇒ valid`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    package: String,
    valid: bool,
    installed: bool,
    updatable: bool,
    installed_version: String,
    available_version: String,
}

impl PackageRecord {
    pub fn builder(package: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            package: package.into(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub fn is_updatable(&self) -> bool {
        self.updatable
    }

    /// 未知时为空字符串
    pub fn installed_version(&self) -> &str {
        &self.installed_version
    }

    /// 不可更新时为空字符串
    pub fn available_version(&self) -> &str {
        &self.available_version
    }
}

/// search 之前
pub struct RecordBuilder {
    package: String,
}

impl RecordBuilder {
    pub fn not_valid(self) -> PackageRecord {
        PackageRecord {
            package: self.package,
            valid: false,
            installed: false,
            updatable: false,
            installed_version: String::new(),
            available_version: String::new(),
        }
    }

    pub fn valid(self) -> ValidRecord {
        ValidRecord {
            package: self.package,
        }
    }
}

/// search 命中之后
pub struct ValidRecord {
    package: String,
}

impl ValidRecord {
    pub fn not_installed(self) -> PackageRecord {
        PackageRecord {
            package: self.package,
            valid: true,
            installed: false,
            updatable: false,
            installed_version: String::new(),
            available_version: String::new(),
        }
    }

    pub fn installed(self, installed_version: impl Into<String>) -> InstalledRecord {
        InstalledRecord {
            package: self.package,
            installed_version: installed_version.into(),
        }
    }
}

/// list 确认已安装之后
pub struct InstalledRecord {
    package: String,
    installed_version: String,
}

impl InstalledRecord {
    pub fn not_updatable(self) -> PackageRecord {
        self.finish(false, String::new())
    }

    pub fn updatable(self, available_version: impl Into<String>) -> PackageRecord {
        self.finish(true, available_version.into())
    }

    fn finish(self, updatable: bool, available_version: String) -> PackageRecord {
        PackageRecord {
            package: self.package,
            valid: true,
            installed: true,
            updatable,
            installed_version: self.installed_version,
            available_version,
        }
    }
}
