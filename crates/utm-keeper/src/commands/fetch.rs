use super::Context;
use utm_keeper_core::{DispatchOptions, RequestOptions, ReqwestDispatcher};

pub fn run(ctx: &Context, url: &str, method: &str, skip_utm: bool) -> anyhow::Result<()> {
    let keeper = ctx.keeper();
    let dispatcher = keeper.decorate_dispatcher(ReqwestDispatcher::default());
    let options = RequestOptions {
        skip_utm,
        dispatch: DispatchOptions {
            method: Some(method.to_string()),
            ..Default::default()
        },
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let response = runtime.block_on(dispatcher.call(url, &options))?;
    tracing::info!(url = %response.url(), status = %response.status(), "request sent");

    let body = runtime.block_on(response.text())?;
    println!("{body}");
    Ok(())
}
