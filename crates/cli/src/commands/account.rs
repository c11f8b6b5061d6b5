//! `fromage account ...`

use std::io::BufRead;

use fromage_storefront::error::AccountError;
use fromage_storefront::session::SessionManager;
use fromage_storefront::shopify::{CommerceApi, CustomerCreateInput};
use fromage_storefront::state::AppState;

/// Read the password from the first line of stdin.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or the line is empty.
pub fn read_password() -> Result<String, Box<dyn std::error::Error>> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("no password on stdin".into());
    }
    Ok(password)
}

/// Build the `customerCreate` input from `account signup` arguments.
#[must_use]
pub fn signup_input(
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    accepts_marketing: bool,
) -> CustomerCreateInput {
    CustomerCreateInput {
        email,
        password,
        first_name,
        last_name,
        accepts_marketing,
    }
}

#[allow(clippy::print_stderr)]
fn print_account_error(error: &AccountError) {
    for (field, message) in error.field_errors() {
        eprintln!("{field}: {message}");
    }
    for message in error.non_field_messages() {
        eprintln!("{message}");
    }
}

/// Re-check the session and print it.
#[allow(clippy::print_stdout)]
pub async fn status<C: CommerceApi>(session: &SessionManager<C>) {
    let authorized = session.revalidate().await;
    let state = session.snapshot();

    match &state.customer {
        Some(customer) => println!("Customer:   {} <{}>", customer.display_name, customer.email),
        None => println!("Customer:   -"),
    }
    match &state.credential {
        Some(credential) => println!("Expires:    {}", credential.expires_at.to_rfc3339()),
        None => println!("Expires:    -"),
    }
    println!("Authorized: {}", if authorized { "yes" } else { "no" });
}

/// Log in.
///
/// # Errors
///
/// Returns the flow's `AccountError` after printing it.
#[allow(clippy::print_stdout)]
pub async fn login<C: CommerceApi>(
    session: &SessionManager<C>,
    email: &str,
    password: &str,
) -> Result<(), AccountError> {
    match session.login(email, password).await {
        Ok(profile) => {
            println!("Welcome back, {}!", profile.display_name);
            Ok(())
        }
        Err(e) => {
            print_account_error(&e);
            Err(e)
        }
    }
}

/// Create an account.
///
/// # Errors
///
/// Returns the flow's `AccountError` after printing it.
#[allow(clippy::print_stdout)]
pub async fn signup<C: CommerceApi>(
    session: &SessionManager<C>,
    input: &CustomerCreateInput,
) -> Result<(), AccountError> {
    match session.create_customer(input).await {
        Ok(profile) => {
            println!("Account created for {}. You can log in now.", profile.email);
            Ok(())
        }
        Err(e) => {
            print_account_error(&e);
            Err(e)
        }
    }
}

/// Log out.
#[allow(clippy::print_stdout)]
pub async fn logout<C: CommerceApi>(session: &SessionManager<C>) {
    session.logout().await;
    println!("Logged out.");
}

/// Request a password reset email.
///
/// # Errors
///
/// Returns the flow's `AccountError` after printing it.
#[allow(clippy::print_stdout)]
pub async fn reset<C: CommerceApi>(
    session: &SessionManager<C>,
    email: &str,
) -> Result<(), AccountError> {
    match session.request_password_reset(email).await {
        Ok(()) => {
            println!("If {email} has an account, a reset link is on its way.");
            Ok(())
        }
        Err(e) => {
            print_account_error(&e);
            Err(e)
        }
    }
}

/// Run background revalidation and print every change of the authorized
/// flag until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the Ctrl-C handler cannot be installed.
#[allow(clippy::print_stdout)]
pub async fn watch<C: CommerceApi>(state: &AppState<C>) -> Result<(), Box<dyn std::error::Error>> {
    let mut authorized = state.session().authorized();
    let task = state.spawn_background_tasks();

    println!("Authorized: {}", *authorized.borrow_and_update());
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            changed = authorized.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("Authorized: {}", *authorized.borrow_and_update());
            }
        }
    }

    task.abort();
    Ok(())
}
