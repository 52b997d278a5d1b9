//! 系统级模块

pub mod logging;
