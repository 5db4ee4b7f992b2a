use crate::commands::common::load_session;
use crate::error::CliError;

pub async fn run_health(global_profile: Option<&str>) -> Result<(), CliError> {
    let session = load_session(global_profile)?;
    let status = session.context.client().health_check().await?;
    println!(
        "{} is reachable: {}",
        session.context.client().config().api_base_url,
        status
    );
    Ok(())
}
