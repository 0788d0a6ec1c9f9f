use chrono::Utc;
use rand::Rng;
use std::path::Path;

/// `<millis>-<random><.ext>` name for a stored upload; the extension is taken from the
/// client file name when it is short and alphanumeric.
pub fn generate_upload_file_name(original_name: Option<&str>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: u32 = rng.gen_range(0..1_000_000_000);
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, ext)
}
