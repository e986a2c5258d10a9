use crate::app::AppContext;
use crate::output::print_findings;

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let ledger = ctx.open_ledger()?;
    let findings = ledger.audit()?;
    print_findings(ctx, &findings)
}
