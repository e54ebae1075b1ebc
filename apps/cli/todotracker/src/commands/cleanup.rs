use crate::context::AppContext;
use crate::error::TodotrackerError;
use crate::output::format_cleanup;

use registry_core::Dashboard;

pub fn run(ctx: &AppContext) -> Result<(), TodotrackerError> {
    let report = Dashboard::new(ctx.store.clone(), &ctx.config).cleanup()?;
    println!("{}", format_cleanup(&report));
    Ok(())
}
