//! External detector process backend.
//!
//! The face/hand models live outside this crate (for example a MediaPipe
//! script). The child process speaks a small protocol on stdio:
//!
//! 1. On start it prints `READY` on its own line.
//! 2. Per frame it receives a header of three little-endian `u32`
//!    (width, height, channels) followed by `width * height * channels` RGB bytes.
//! 3. It answers with one JSON line: `{"faces": [...], "hands": [...]}`, or
//!    `{"error": "..."}` when it could not process the frame.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::detect::backend::{DetectionCapability, DetectorBackend};
use crate::detect::result::{DetectionResult, FaceRegion, HandLandmarks};
use crate::frame::{FrameView, RGB_CHANNELS};

const READY_LINE: &str = "READY";

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    faces: Vec<FaceRegion>,
    #[serde(default)]
    hands: Vec<HandLandmarks>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SubprocessBackend {
    process: Child,
    stdout_reader: BufReader<ChildStdout>,
    command_line: String,
}

impl SubprocessBackend {
    /// Spawn the detector. `command_line` is split on whitespace into program + args.
    pub fn spawn(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("detector command must not be empty"))?;
        let args: Vec<&str> = parts.collect();
        Self::spawn_with_args(program, &args)
    }

    pub fn spawn_with_args(program: &str, args: &[&str]) -> Result<Self> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        log::info!("starting detector subprocess: {}", command_line);

        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start detector '{}'", command_line))?;

        let stdout = process
            .stdout
            .take()
            .context("detector subprocess has no stdout")?;
        let mut stdout_reader = BufReader::new(stdout);

        let mut ready_line = String::new();
        stdout_reader
            .read_line(&mut ready_line)
            .context("failed to read detector handshake")?;
        if ready_line.trim() != READY_LINE {
            let _ = process.kill();
            let _ = process.wait();
            bail!(
                "detector subprocess did not signal ready, got: {:?}",
                ready_line.trim()
            );
        }
        log::info!("detector subprocess ready");

        Ok(Self {
            process,
            stdout_reader,
            command_line,
        })
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }
}

impl DetectorBackend for SubprocessBackend {
    fn name(&self) -> &'static str {
        "subprocess"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(
            capability,
            DetectionCapability::FacePresence | DetectionCapability::HandLandmarks
        )
    }

    fn detect(&mut self, frame: &FrameView<'_>) -> Result<DetectionResult> {
        let stdin = self
            .process
            .stdin
            .as_mut()
            .context("detector subprocess has no stdin")?;
        stdin.write_all(&frame.width().to_le_bytes())?;
        stdin.write_all(&frame.height().to_le_bytes())?;
        stdin.write_all(&(RGB_CHANNELS as u32).to_le_bytes())?;
        stdin.write_all(frame.pixels())?;
        stdin.flush()?;

        let mut response = String::new();
        let read = self
            .stdout_reader
            .read_line(&mut response)
            .context("failed to read detector reply")?;
        if read == 0 {
            bail!("detector subprocess closed its output");
        }

        let reply: Reply = serde_json::from_str(response.trim())
            .with_context(|| format!("failed to parse detector reply: {}", response.trim()))?;
        if let Some(error) = reply.error {
            bail!("detector reported: {}", error);
        }

        log::trace!(
            "detector frame {}: {} face(s), {} hand(s)",
            frame.index(),
            reply.faces.len(),
            reply.hands.len()
        );
        Ok(DetectionResult {
            faces: reply.faces,
            hands: reply.hands,
        })
    }
}

impl Drop for SubprocessBackend {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn handshake_and_single_reply() {
        let script = r#"echo READY; echo '{"faces":[{"x":0.1,"y":0.1,"w":0.2,"h":0.2}],"hands":[]}'; cat > /dev/null"#;
        let mut backend = SubprocessBackend::spawn_with_args("sh", &["-c", script]).unwrap();
        let frame = Frame::filled(4, 4, 1, [10, 20, 30]).unwrap();
        let result = backend.detect(&frame.view()).unwrap();
        assert_eq!(result.faces.len(), 1);
        assert!(result.hands.is_empty());
    }

    #[test]
    fn error_reply_is_a_frame_failure() {
        let script = r#"echo READY; echo '{"error":"bad frame"}'; cat > /dev/null"#;
        let mut backend = SubprocessBackend::spawn_with_args("sh", &["-c", script]).unwrap();
        let frame = Frame::filled(2, 2, 1, [0, 0, 0]).unwrap();
        let err = backend.detect(&frame.view()).unwrap_err();
        assert!(err.to_string().contains("bad frame"));
    }

    #[test]
    fn missing_handshake_is_rejected() {
        assert!(SubprocessBackend::spawn_with_args("sh", &["-c", "echo NOPE"]).is_err());
        assert!(SubprocessBackend::spawn("   ").is_err());
    }
}
