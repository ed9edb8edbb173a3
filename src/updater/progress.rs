//! 进度事件

use tokio::sync::mpsc;

/// 包在处理流水线中进入的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressStatus {
    Valid,
    NotValid,
    Installed,
    NotInstalled,
    Updatable,
    NotUpdatable,
    Updated,
    NotUpdated,
}

impl ProgressStatus {
    /// 流水线阶段：search = 1, list = 2, 可更新判断 = 3, upgrade = 4
    pub fn stage(self) -> u8 {
        match self {
            Self::Valid | Self::NotValid => 1,
            Self::Installed | Self::NotInstalled => 2,
            Self::Updatable | Self::NotUpdatable => 3,
            Self::Updated | Self::NotUpdated => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub package: String,
    pub status: ProgressStatus,
}

/// 调用方持有接收端，引擎同步推送事件
pub type ProgressSink = mpsc::UnboundedSender<ProgressEvent>;

pub(crate) fn report(sink: Option<&ProgressSink>, package: &str, status: ProgressStatus) {
    log::debug!("{} [{}/4] {:?}", package, status.stage(), status);
    if let Some(tx) = sink {
        // 接收端已关闭时丢弃事件即可
        let _ = tx.send(ProgressEvent {
            package: package.to_string(),
            status,
        });
    }
}
