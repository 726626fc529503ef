use access_console::AccessConsole;
use access_console::config::get_configuration;
use access_console::services::{flatten_with_indent, sort_by_order};
use console_core::observability::init_tracing;
use secrecy::ExposeSecret;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logout_on_exit = std::env::args().skip(1).any(|arg| arg == "--logout");

    let settings = get_configuration()?;

    init_tracing(
        "access-console",
        &settings.telemetry.log_level,
        settings.telemetry.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(base_url = %settings.api.base_url, "Starting access console");

    let console = AccessConsole::build(&settings)?;

    if !console.session.restore() {
        let Some(credentials) = &settings.credentials else {
            anyhow::bail!("No stored session and no credentials configured");
        };
        let logged_in = console
            .session
            .login(&credentials.username, credentials.password.expose_secret())
            .await;
        if !logged_in {
            anyhow::bail!("Login failed for '{}'", credentials.username);
        }
    }

    let user = console.session.current_user().await?;
    tracing::info!(
        user_id = user.id,
        username = %user.username,
        roles = ?user.roles,
        remaining_secs = console.session.remaining_time_secs(),
        "Signed in"
    );

    let mut departments = console.departments.tree().await?;
    sort_by_order(&mut departments);
    for option in flatten_with_indent(&departments)? {
        tracing::info!(department_id = option.value, label = %option.label, "Department");
    }

    // Keep the refresh timer running until interrupted or the session ends
    let mut auth_state = console.session.subscribe();
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            changed = auth_state.changed() => {
                if changed.is_err() || !auth_state.borrow().authenticated {
                    tracing::warn!("Session ended, re-run to log in again");
                    break;
                }
            }
        }
    }

    if logout_on_exit {
        console.session.logout();
    }

    Ok(())
}
