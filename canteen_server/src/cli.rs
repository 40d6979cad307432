use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Never add variables holding secrets to this list
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "CANTEEN_HOST",
        "CANTEEN_PORT",
        "CANTEEN_DATABASE_URL",
        "CANTEEN_JWT_EXPIRY_DAYS",
        "CANTEEN_RAZORPAY_KEY_ID",
        "CANTEEN_RAZORPAY_API_URL",
        "CANTEEN_WHATSAPP_FROM",
        "CANTEEN_WHATSAPP_API_URL",
        "CANTEEN_WHATSAPP_COUNTRY_CODE",
        "CANTEEN_STRICT_ORDER_TRANSITIONS",
        "CANTEEN_EVENT_BUFFER_SIZE",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
