use super::Context;
use anyhow::Result;
use colored::Colorize;

pub async fn login(ctx: &Context, username: &str, password: &str) -> Result<()> {
    let login = ctx.auth().login(username, password).await?;
    ctx.store_token(Some(login.access_token))?;

    println!(
        "{} {} ({})",
        "Logged in as".green(),
        login.user.username.bold(),
        login.user.role.label()
    );
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.auth().logout();
    ctx.store_token(None)?;
    println!("{}", "Logged out".green());
    Ok(())
}
