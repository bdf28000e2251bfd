use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use jobsched_common::config::ExecutorConfig;

/// Runs one job's container. Never raises — a failure to even invoke the
/// runtime becomes `(exit_code != 0, descriptive text)`, matching the
/// contract in §4.5.
pub async fn run(config: &ExecutorConfig, image: &str, command: &[String], script: Option<&str>) -> (i32, String) {
    let mut cmd = Command::new(&config.container_runtime);
    cmd.arg("run").arg("--rm");

    let stdin_payload = if let Some(script) = script {
        cmd.arg("-i").arg(image);
        let (interpreter, args) = interpreter_for(image);
        cmd.arg(interpreter);
        for arg in args {
            cmd.arg(arg);
        }
        Some(script.to_string())
    } else {
        cmd.arg(image);
        for arg in command {
            cmd.arg(arg);
        }
        None
    };

    cmd.stdin(if stdin_payload.is_some() { Stdio::piped() } else { Stdio::null() });
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return (1, format!("failed to start container runtime: {}", e)),
    };

    if let Some(payload) = stdin_payload {
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                return (1, format!("failed to write script to container stdin: {}", e));
            }
            drop(stdin);
        }
    }

    let timeout = Duration::from_secs(config.run_timeout_seconds);
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return (1, format!("failed to wait on container: {}", e)),
        Err(_) => return (1, format!("container exceeded {}s timeout", config.run_timeout_seconds)),
    };

    let exit_code = output.status.code().unwrap_or(1);

    let mut combined = Vec::with_capacity(output.stdout.len() + output.stderr.len());
    combined.extend_from_slice(&output.stdout);
    combined.extend_from_slice(&output.stderr);

    let mut text = String::from_utf8_lossy(&combined).into_owned();
    if text.len() > config.result_truncate_bytes {
        let mut boundary = config.result_truncate_bytes;
        while !text.is_char_boundary(boundary) {
            boundary -= 1;
        }
        text.truncate(boundary);
        text.push_str("\n... [truncated]");
    }

    (exit_code, text)
}

/// Language-appropriate interpreter for a script, keyed by a substring match
/// against the image reference (§4.5). `sh -s` is the fallback for anything
/// unrecognized.
fn interpreter_for(image: &str) -> (&'static str, Vec<&'static str>) {
    let lower = image.to_ascii_lowercase();
    if lower.contains("python") {
        ("python3", vec!["-"])
    } else if lower.contains("node") {
        ("node", vec!["-"])
    } else {
        ("sh", vec!["-s"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_python_interpreter() {
        assert_eq!(interpreter_for("python:3.12-slim"), ("python3", vec!["-"]));
    }

    #[test]
    fn picks_node_interpreter() {
        assert_eq!(interpreter_for("node:20-alpine"), ("node", vec!["-"]));
    }

    #[test]
    fn falls_back_to_shell() {
        assert_eq!(interpreter_for("alpine:latest"), ("sh", vec!["-s"]));
    }
}
