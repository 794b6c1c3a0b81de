//! 交互上下文
//!
//! 封装"我正在处理哪一次上传"这一信息，只用于日志

use std::fmt::Display;

/// 交互上下文
#[derive(Debug, Clone)]
pub struct InteractionCtx {
    /// 交互编号（本地时间戳）
    pub id: String,
    /// 上传的图片文件名
    pub image_name: String,
}

impl InteractionCtx {
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            id: chrono::Local::now().format("%Y%m%d-%H%M%S").to_string(),
            image_name: image_name.into(),
        }
    }
}

impl Display for InteractionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[交互 #{} 图片#{}]", self.id, self.image_name)
    }
}
