//! 抽象层 Trait 定义

mod email_provider_factory;

pub use email_provider_factory::{EmailProviderFactory, SendgridProviderFactory};
