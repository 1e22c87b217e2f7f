use super::Context;
use super::values::{parse_attendance, parse_patch};
use anyhow::{Result, bail};
use campus_core::patch::{FieldValue, flatten, is_editable_field};
use campus_core::user::{CreateUserRequest, Role, UpdateUserRequest, User, UserDetail};
use colored::{ColoredString, Colorize};

pub fn role_badge(role: Role) -> ColoredString {
    let label = format!("[{}]", role.label());
    match role {
        Role::Admin => label.red().bold(),
        Role::Teacher => label.blue().bold(),
        Role::Student => label.green().bold(),
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("{}", "No users".dimmed());
        return;
    }
    for user in users {
        println!(
            "{:<26} {:<12} {:<20} {:<28} {}",
            user.id,
            role_badge(user.role),
            user.username,
            user.email.as_deref().unwrap_or("-"),
            user.created_at.as_deref().unwrap_or("-").dimmed()
        );
    }
    println!("{}", format!("{} user(s)", users.len()).dimmed());
}

fn print_detail(detail: &UserDetail) -> Result<()> {
    let profile = detail.profile();
    println!(
        "{} {} {}",
        role_badge(profile.role),
        profile.username.bold(),
        profile.id.dimmed()
    );

    let FieldValue::Map(fields) = FieldValue::from_serialize(detail)? else {
        bail!("User detail is not an object");
    };
    for (key, value) in flatten(&fields) {
        let line = format!("  {key} = {}", value.to_json());
        if is_editable_field(&key) {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<()> {
    let users = ctx.usecase().load_users().await?;
    print_users(&users);
    Ok(())
}

pub async fn show(ctx: &Context, id: &str) -> Result<()> {
    let detail = ctx.usecase().user_details(id).await?;
    print_detail(&detail)
}

pub async fn create(
    ctx: &Context,
    username: String,
    password: String,
    role: Role,
    email: Option<String>,
) -> Result<()> {
    let request = CreateUserRequest {
        username,
        email,
        password,
        role,
    };
    let user = ctx.usecase().create_user(&request).await?;
    println!(
        "{} {} {} ({})",
        "Created".green(),
        role_badge(user.role),
        user.username.bold(),
        user.id
    );
    Ok(())
}

pub async fn update(
    ctx: &Context,
    id: &str,
    username: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let request = UpdateUserRequest { username, email };
    if request.is_empty() {
        bail!("Nothing to update: pass --username and/or --email");
    }
    let user = ctx.usecase().update_user(id, &request).await?;
    println!("{} {}", "Updated".green(), user.username.bold());
    Ok(())
}

pub async fn delete(ctx: &Context, id: &str) -> Result<()> {
    let remaining = ctx.usecase().delete_user(id).await?;
    println!(
        "{} {} ({} user(s) left)",
        "Deleted".green(),
        id,
        remaining.len()
    );
    Ok(())
}

pub async fn patch(ctx: &Context, id: &str, fields: &[String]) -> Result<()> {
    let patch = parse_patch(fields)?;
    let read_only = patch.read_only_keys();
    if !read_only.is_empty() {
        bail!("Read-only field(s): {}", read_only.join(", "));
    }

    let usecase = ctx.usecase();
    usecase.store().update_user_patch(id, &patch).await?;
    usecase.store().clear_user_details_cache(Some(id));
    let detail = usecase.user_details(id).await?;

    println!("{}", "User updated successfully".green());
    print_detail(&detail)
}

pub async fn attendance(ctx: &Context, id: &str, entries: &[String]) -> Result<()> {
    let updates = parse_attendance(entries)?;
    let usecase = ctx.usecase();

    let current = usecase.user_details(id).await?;
    if current.role() != Role::Student {
        bail!("{} is not a student", current.profile().username);
    }
    let mut record = current.attendance();
    record.extend(updates);

    let detail = usecase.save_attendance(id, &record).await?;
    println!("{}", "Attendance saved".green());
    for (date, status) in detail.attendance() {
        println!("  {date}  {status}");
    }
    Ok(())
}
