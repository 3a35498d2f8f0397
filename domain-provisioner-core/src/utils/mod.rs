//! 工具模块

pub mod domain;
pub mod domain_locks;
