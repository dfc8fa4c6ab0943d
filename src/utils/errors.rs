//! User-Friendly Error Formatting
//!
//! Provides user-friendly error messages with troubleshooting hints
//! for common error scenarios.

use std::fmt::Write;

/// Format error for user consumption
///
/// Takes technical error and produces user-friendly message with
/// troubleshooting steps and context.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Header
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    // The full chain, so context added by callers is matched too
    let error_msg = format!("{:#}", error);
    let lowered = error_msg.to_lowercase();

    if lowered.contains("config") {
        format_config_error(&mut output, &error_msg);
    } else if lowered.contains("bluetooth") {
        format_bluetooth_error(&mut output, &error_msg);
    } else if lowered.contains("transport") || lowered.contains("messenger") {
        format_transport_error(&mut output, &error_msg);
    } else if lowered.contains("device") || lowered.contains("unavailable") {
        format_platform_error(&mut output, &error_msg);
    } else {
        format_generic_error(&mut output, &error_msg);
    }

    // Technical details
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    // Footer with help
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: headunit-services -vvv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Write logs to a file: headunit-services --log-file headunit.log"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_config_error(output: &mut String, _error: &str) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(output, "     → Specify: headunit-services -c /path/to/headunit.toml").ok();
    writeln!(output, "     → Start from the bundled headunit.toml").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Rejected value").ok();
    writeln!(output, "     → video.fps must be 30 or 60").ok();
    writeln!(output, "     → navigation.colour_depth_bits must be 8, 16, 24 or 32").ok();
    writeln!(output, "     → input needs a touchscreen or at least one button").ok();
}

fn format_bluetooth_error(output: &mut String, _error: &str) {
    writeln!(output, "Bluetooth Error").ok();
    writeln!(output).ok();
    writeln!(output, "The bluetooth channel could not be set up.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Malformed adapter address").ok();
    writeln!(output, "     → Expected six hex pairs: 00:11:22:33:44:55").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Adapter not present or powered off").ok();
    writeln!(output, "     → Leave bluetooth.adapter_address unset to skip the channel").ok();
}

fn format_transport_error(output: &mut String, _error: &str) {
    writeln!(output, "Phone Link Error").ok();
    writeln!(output).ok();
    writeln!(output, "The transport to the phone failed.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Phone disconnected").ok();
    writeln!(output, "     → Reconnect the cable or restart wireless projection").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Phone stopped responding").ok();
    writeln!(output, "     → Set channel.send_timeout_ms to bound stalled sends").ok();
}

fn format_platform_error(output: &mut String, _error: &str) {
    writeln!(output, "Platform Device Error").ok();
    writeln!(output).ok();
    writeln!(output, "A video, audio or input device could not be used.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Device busy or missing").ok();
    writeln!(output, "     → Check no other process holds the device").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Unsupported video configuration").ok();
    writeln!(output, "     → Try video.resolution = \"480p\" and video.fps = 30").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Head Unit Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while running the head unit services.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}
