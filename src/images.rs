use image::imageops::FilterType;
use std::fs;
use std::path::Path;

/// Directory avatars are written to, served under `/uploads/avatars/`.
pub const AVATAR_DIR: &str = "website/uploads/avatars";

/// Hosts reciter and avatar images may be displayed from.
pub fn allowed_hosts(image_domains: &str) -> Vec<String> {
    image_domains
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Generated placeholder for records without a usable image.
pub fn fallback_avatar(id: i64) -> String {
    format!("https://avatar.iran.liara.run/public/{}", id + 20)
}

/// The URL to render for a stored image: local uploads and allowlisted hosts
/// pass through, anything else is replaced by the generated avatar.
pub fn display_url(image: Option<&str>, id: i64, allowed: &[String]) -> String {
    let image = match image.map(str::trim) {
        Some(i) if !i.is_empty() => i,
        _ => return fallback_avatar(id),
    };

    if image.starts_with("/uploads/") {
        return image.to_string();
    }

    let host_ok = url::Url::parse(image)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .map(|h| allowed.iter().any(|a| *a == h))
        .unwrap_or(false);

    if host_ok {
        image.to_string()
    } else {
        fallback_avatar(id)
    }
}

/// Check if file size is within the configured limit
pub fn check_file_size(max_mb: i64, size_bytes: u64) -> bool {
    let max_mb = max_mb.max(1) as u64;
    size_bytes <= max_mb * 1024 * 1024
}

/// Whether an upload's declared content type is an image.
pub fn is_image_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

/// Decode an uploaded image, crop-resize it to a `size`×`size` square PNG
/// under `dest_dir`, and return the new file name.
pub fn process_avatar(src_path: &Path, dest_dir: &str, size: u32) -> Result<String, String> {
    let size = if size == 0 { 256 } else { size };
    // Temp uploads carry no extension, so sniff the format from the bytes
    let bytes = fs::read(src_path).map_err(|e| e.to_string())?;
    let img = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    let avatar = img.resize_to_fill(size, size, FilterType::Lanczos3);

    fs::create_dir_all(dest_dir).map_err(|e| e.to_string())?;
    let file_name = format!("{}.png", uuid::Uuid::new_v4());
    let full = Path::new(dest_dir).join(&file_name);
    avatar.save(&full).map_err(|e| e.to_string())?;

    Ok(file_name)
}

/// Delete a previously stored avatar given its public URL.
pub fn delete_avatar(public_url: &str) {
    if let Some(name) = public_url.strip_prefix("/uploads/avatars/") {
        if !name.contains('/') && !name.contains("..") {
            let _ = fs::remove_file(Path::new(AVATAR_DIR).join(name));
        }
    }
}
