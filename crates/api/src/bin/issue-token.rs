//! Access token utility for the back office
//!
//! Prints a signed access token for an employee, for local use and smoke
//! tests. The signing secret is read from `JWT_SECRET`.
//!
//! Usage:
//!   cargo run --bin issue-token -- <employee_id> <email> [RESOURCE=cap,cap ...]
//!
//! Example:
//!   cargo run --bin issue-token -- 1 admin@shop.test \
//!       AdminSecurity=read,create,update,delete AdminSecurity_=delete

use std::env;
use std::process::ExitCode;

use backoffice_api::auth::{Grants, JwtManager};
use backoffice_shared::Capability;

fn parse_grant(arg: &str) -> Result<(String, Vec<Capability>), String> {
    let (resource, capabilities) = arg
        .split_once('=')
        .ok_or_else(|| format!("Expected RESOURCE=cap,cap but got {:?}", arg))?;

    let capabilities = capabilities
        .split(',')
        .filter(|c| !c.trim().is_empty())
        .map(|c| c.trim().parse::<Capability>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok((resource.to_string(), capabilities))
}

fn run() -> Result<String, String> {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let employee_id: i64 = args
        .next()
        .ok_or("Missing employee id")?
        .parse()
        .map_err(|_| "Employee id must be an integer")?;
    let email = args.next().ok_or("Missing email")?;

    let mut grants = Grants::new();
    for arg in args {
        let (resource, capabilities) = parse_grant(&arg)?;
        grants.entry(resource).or_default().extend(capabilities);
    }

    let secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET is not set")?;
    if secret.len() < 32 {
        return Err("JWT_SECRET must be at least 32 characters".to_string());
    }
    let expiry_hours = env::var("JWT_EXPIRY_HOURS")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or(8);

    let (token, _) = JwtManager::new(&secret, expiry_hours)
        .generate_token(employee_id, &email, grants)
        .map_err(|e| e.to_string())?;
    Ok(token)
}

fn main() -> ExitCode {
    match run() {
        Ok(token) => {
            println!("{}", token);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: issue-token <employee_id> <email> [RESOURCE=cap,cap ...]");
            ExitCode::FAILURE
        }
    }
}
