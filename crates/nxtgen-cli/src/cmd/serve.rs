use anyhow::Context;
use nxtgen_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let port = match port {
        Some(p) => p,
        None => {
            Config::load(root)
                .context("failed to load config")?
                .server
                .port
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("cannot bind port {port}"))?;
        let actual_port = listener.local_addr()?.port();
        println!("nxtgen API → http://localhost:{actual_port}  (PID {})", std::process::id());
        nxtgen_server::serve_on(root_buf, listener).await
    })
}
