use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

pub fn default_claude_model() -> String {
    "sonnet".to_string()
}

pub fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

pub fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from(".testpilot/sessions")
}

pub fn default_gemini_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

pub fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

pub fn default_claude_binary() -> PathBuf {
    // Check common install location first
    if let Some(home) = std::env::var_os("HOME") {
        let local_path = PathBuf::from(home).join(".claude/local/claude");
        if local_path.exists() {
            return local_path;
        }
    }
    // Fall back to PATH lookup
    PathBuf::from("claude")
}

pub fn default_true() -> bool {
    true
}
