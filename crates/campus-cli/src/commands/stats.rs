use super::Context;
use super::users::role_badge;
use anyhow::{Result, bail};
use campus_core::user::{DateRange, Role};
use chrono::NaiveDate;
use colored::Colorize;

pub async fn count(ctx: &Context) -> Result<()> {
    let counts = ctx.usecase().dashboard().await?;
    for role in Role::ALL {
        println!(
            "{:<12} {}",
            role_badge(role),
            counts.get(&role).copied().unwrap_or(0)
        );
    }
    println!(
        "{:<12} {}",
        "Total".bold(),
        counts.values().sum::<u64>()
    );
    Ok(())
}

pub async fn growth(ctx: &Context, from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        bail!("--from must not be after --to");
    }
    let stats = ctx.usecase().growth(&DateRange::new(from, to)).await?;
    println!("{}", format!("Growth {from} .. {to}").bold());
    for (label, value) in stats {
        let value = if value < 0.0 {
            format!("{value:.2}").red()
        } else {
            format!("{value:.2}").green()
        };
        println!("  {label:<12} {value}");
    }
    Ok(())
}
