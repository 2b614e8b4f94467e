use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,majiang_engine=debug";

/// 安装全局 tracing 订阅者（只由可执行程序调用，库本身从不安装）
///
/// `RUST_LOG` 优先；`json` 为 true 时输出结构化 JSON 日志
pub fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(false)
            .json();
        registry.with(fmt_layer).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
