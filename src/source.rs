//! Where the text to translate comes from.

use std::io::Read;
use std::thread;
use std::time::Duration;

use crate::error::SourceError;

/// Delay between the simulated copy keystroke and reading the clipboard.
const COPY_SETTLE: Duration = Duration::from_millis(100);

pub trait TextSource: Send + Sync {
    /// Short noun used in status lines ("clipboard", "selected").
    fn label(&self) -> &'static str;

    fn fetch_text(&self) -> Result<String, SourceError>;
}

pub struct ClipboardSource;

impl TextSource for ClipboardSource {
    fn label(&self) -> &'static str {
        "clipboard"
    }

    fn fetch_text(&self) -> Result<String, SourceError> {
        read_clipboard()
    }
}

/// Copies the current OS selection by simulating the copy shortcut.
///
/// The clipboard is cleared first so a failed copy is seen as empty text
/// rather than stale clipboard content, then restored afterwards.
pub struct SelectionSource;

impl TextSource for SelectionSource {
    fn label(&self) -> &'static str {
        "selected"
    }

    fn fetch_text(&self) -> Result<String, SourceError> {
        if !platform::CAN_SEND_COPY {
            return Err(SourceError::Unsupported("copying the selection"));
        }
        copy_selection(&SystemClipboard, || {
            platform::send_copy_keystroke()?;
            thread::sleep(COPY_SETTLE);
            Ok(())
        })
    }
}

/// Clipboard access used by [`copy_selection`].
trait Clipboard {
    fn read(&self) -> Result<String, SourceError>;
    fn write(&self, text: String) -> Result<(), SourceError>;
}

struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn read(&self) -> Result<String, SourceError> {
        read_clipboard()
    }

    fn write(&self, text: String) -> Result<(), SourceError> {
        write_clipboard(text)
    }
}

/// Clears the clipboard, runs `copy`, reads the result and puts the original
/// content back whether or not the copy worked.
fn copy_selection(
    clipboard: &impl Clipboard,
    copy: impl FnOnce() -> Result<(), SourceError>,
) -> Result<String, SourceError> {
    let original = clipboard.read().unwrap_or_default();
    // clearing can fail on an already-empty clipboard
    let _ = clipboard.write(String::new());

    let text = copy().and_then(|()| clipboard.read());

    if !original.is_empty() {
        if let Err(err) = clipboard.write(original) {
            tracing::warn!(%err, "failed to restore clipboard");
        }
    }
    text
}

pub struct StdinSource;

impl TextSource for StdinSource {
    fn label(&self) -> &'static str {
        "input"
    }

    fn fetch_text(&self) -> Result<String, SourceError> {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    }
}

#[derive(Debug, Clone)]
pub struct FixedText(pub String);

impl TextSource for FixedText {
    fn label(&self) -> &'static str {
        "input"
    }

    fn fetch_text(&self) -> Result<String, SourceError> {
        Ok(self.0.clone())
    }
}

pub fn read_clipboard() -> Result<String, SourceError> {
    platform::read_clipboard()
}

pub fn write_clipboard(text: String) -> Result<(), SourceError> {
    platform::write_clipboard(text)
}

#[cfg(windows)]
mod platform {
    use crate::error::SourceError;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
        VIRTUAL_KEY, VK_CONTROL,
    };

    pub const CAN_SEND_COPY: bool = true;

    pub fn read_clipboard() -> Result<String, SourceError> {
        clipboard_win::get_clipboard_string().map_err(|e| SourceError::Clipboard(e.to_string()))
    }

    pub fn write_clipboard(text: String) -> Result<(), SourceError> {
        clipboard_win::set_clipboard_string(&text).map_err(|e| SourceError::Clipboard(e.to_string()))
    }

    fn key(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT { wVk: vk, wScan: 0, dwFlags: flags, time: 0, dwExtraInfo: 0 },
            },
        }
    }

    /// Ctrl+C via SendInput.
    pub fn send_copy_keystroke() -> Result<(), SourceError> {
        let c = VIRTUAL_KEY(b'C' as u16);
        let down = KEYBD_EVENT_FLAGS(0);
        let inputs = [
            key(VK_CONTROL, down),
            key(c, down),
            key(c, KEYEVENTF_KEYUP),
            key(VK_CONTROL, KEYEVENTF_KEYUP),
        ];
        let sent = unsafe { SendInput(&inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(SourceError::Keystroke(format!(
                "SendInput accepted {sent} of {} events",
                inputs.len()
            )));
        }
        Ok(())
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::error::SourceError;
    use cli_clipboard::{ClipboardContext, ClipboardProvider};

    pub const CAN_SEND_COPY: bool = cfg!(target_os = "macos");

    pub fn read_clipboard() -> Result<String, SourceError> {
        let mut ctx = ClipboardContext::new().map_err(|e| SourceError::Clipboard(e.to_string()))?;
        ctx.get_contents().map_err(|e| SourceError::Clipboard(e.to_string()))
    }

    pub fn write_clipboard(text: String) -> Result<(), SourceError> {
        let mut ctx = ClipboardContext::new().map_err(|e| SourceError::Clipboard(e.to_string()))?;
        ctx.set_contents(text).map_err(|e| SourceError::Clipboard(e.to_string()))
    }

    /// Cmd+C through System Events; needs accessibility permission.
    #[cfg(target_os = "macos")]
    pub fn send_copy_keystroke() -> Result<(), SourceError> {
        let script = r#"
            tell application "System Events"
                keystroke "c" using command down
            end tell
        "#;
        let output = std::process::Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SourceError::Keystroke(stderr.trim().to_string()))
        }
    }

    #[cfg(not(target_os = "macos"))]
    pub fn send_copy_keystroke() -> Result<(), SourceError> {
        Err(SourceError::Unsupported("copying the selection"))
    }
}
