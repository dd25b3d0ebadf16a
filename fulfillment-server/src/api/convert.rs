//! 错误转换模块
//!
//! 将引擎错误 (ManagerError / CommandError) 转换为 HTTP 层的 AppError

use crate::orders::ManagerError;
use crate::utils::{AppError, ErrorCode};
use shared::order::CommandError;

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        command_error_to_app(err.into())
    }
}

fn command_error_to_app(err: CommandError) -> AppError {
    AppError::with_message(ErrorCode::from(err.code), err.message)
}
