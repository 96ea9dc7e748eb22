use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::Session;
use crate::error::AppError;

pub const LOGIN_URL: &str = "https://passport.webnovel.com/login.html";

/// Navigates to the login page and blocks until the operator confirms
/// they have signed in. Deliberately unbounded: this wait is human-paced,
/// unlike the bounded page-readiness polls.
pub async fn wait_for_login<R>(session: &Session, input: &mut R) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    session.goto(LOGIN_URL).await?;
    println!("Please log in to the site, then press [Return] to continue");
    read_acknowledgement(input).await?;
    Ok(())
}

async fn read_acknowledgement<R>(input: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(())
}
