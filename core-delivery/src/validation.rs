//! Upload validation: extension allow-list, dangerous-pattern rejection,
//! MIME allow-list, and magic-byte content sniffing.
//!
//! Every rejection carries a user-facing reason; the upload form renders
//! these inline.

use std::path::Path;
use thiserror::Error;

/// Safe extensions for digital products.
const ALLOWED_EXTENSIONS: &[&str] = &[
    // Archives
    "zip", "rar", "7z", "tar", "gz",
    // Documents
    "pdf", "doc", "docx", "txt", "rtf",
    // Images
    "jpg", "jpeg", "png", "gif", "webp",
    // Audio
    "mp3", "wav", "ogg", "flac", "m4a",
    // Video
    "mp4", "avi", "mov", "wmv", "flv", "webm",
    // E-books
    "epub", "mobi", "azw", "azw3",
    // Spreadsheets
    "xls", "xlsx", "csv",
    // Presentations
    "ppt", "pptx",
    // Web files
    "css", "js", "json", "xml",
];

/// Substrings that reject a filename outright, even when it also carries an
/// allowed extension. Catches double-extension tricks like `invoice.pdf.exe`
/// and `archive.php.zip`.
const DANGEROUS_PATTERNS: &[&str] = &[
    ".php", ".phtml", ".asp", ".aspx", ".jsp", ".cgi", ".pl", ".py", ".exe", ".com", ".bat",
    ".cmd", ".scr", ".vbs", ".jar", ".sh", ".bash", ".zsh", ".fish", ".htaccess", ".htpasswd",
];

/// MIME types an upload may declare (via its extension).
const ALLOWED_MIME_TYPES: &[&str] = &[
    // Archives
    "application/zip",
    "application/x-zip-compressed",
    "application/x-rar-compressed",
    "application/vnd.rar",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
    "application/x-gzip",
    // Documents
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/rtf",
    // Images
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    // Audio
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/ogg",
    "audio/flac",
    "audio/x-flac",
    "audio/m4a",
    "audio/x-m4a",
    // Video
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-ms-wmv",
    "video/x-flv",
    "video/webm",
    // E-books
    "application/epub+zip",
    "application/x-mobipocket-ebook",
    // Spreadsheets
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
    // Presentations
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    // Web files
    "text/css",
    "application/javascript",
    "text/javascript",
    "application/json",
    "application/xml",
    "text/xml",
];

/// Content signatures that are never acceptable regardless of extension.
const EXECUTABLE_TYPES: &[&str] = &[
    "application/x-msdownload",
    "application/x-executable",
    "text/x-shellscript",
];

// Container signatures cover whole extension families: a docx really is a
// zip on the wire, a doc really is an OLE compound file.
const ZIP_CONTAINER_EXTENSIONS: &[&str] = &["zip", "docx", "xlsx", "pptx", "epub"];
const OLE_CONTAINER_EXTENSIONS: &[&str] = &["doc", "xls", "ppt"];
const MP4_CONTAINER_EXTENSIONS: &[&str] = &["mp4", "mov", "m4a"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a file to upload.")]
    NoFile,

    #[error("File type not allowed. Only safe file types are permitted.")]
    ExtensionNotAllowed { extension: String },

    #[error("File name contains a disallowed pattern ({pattern}).")]
    DisallowedPattern { pattern: &'static str },

    #[error("File content type validation failed. The file may be corrupted or have an incorrect extension.")]
    ContentMismatch,

    #[error("File size too large. Maximum allowed size is {max}.")]
    TooLarge { max: String },

    #[error("The selected file is empty.")]
    Empty,
}

pub(crate) fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Extension allow-list plus dangerous-pattern substring rejection.
pub fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    if filename.is_empty() {
        return Err(ValidationError::NoFile);
    }

    let extension = extension_of(filename);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::ExtensionNotAllowed { extension });
    }

    let lower = filename.to_lowercase();
    for &pattern in DANGEROUS_PATTERNS {
        if lower.contains(pattern) {
            return Err(ValidationError::DisallowedPattern { pattern });
        }
    }

    Ok(())
}

/// The extension-implied MIME type must be on the allow-list.
///
/// Extensions with no known mapping pass: the allow-list above already
/// accepted them, and there is nothing further to cross-check.
pub fn validate_declared_mime(filename: &str) -> Result<(), ValidationError> {
    let candidates = mime_guess::from_path(filename);
    if candidates.is_empty() {
        return Ok(());
    }

    let allowed = candidates
        .iter_raw()
        .any(|mime| ALLOWED_MIME_TYPES.contains(&mime));
    if allowed {
        Ok(())
    } else {
        Err(ValidationError::ContentMismatch)
    }
}

/// Identify well-known content by magic bytes. Returns `None` when the
/// signature is not recognized.
pub(crate) fn sniff_content_type(head: &[u8]) -> Option<&'static str> {
    if head.starts_with(b"MZ") {
        return Some("application/x-msdownload");
    }
    if head.starts_with(&[0x7f, b'E', b'L', b'F']) {
        return Some("application/x-executable");
    }
    if head.starts_with(b"#!") {
        return Some("text/x-shellscript");
    }
    if head.starts_with(b"%PDF") {
        return Some("application/pdf");
    }
    if head.starts_with(&[0x89, b'P', b'N', b'G']) {
        return Some("image/png");
    }
    if head.starts_with(&[0xff, 0xd8, 0xff]) {
        return Some("image/jpeg");
    }
    if head.starts_with(b"GIF8") {
        return Some("image/gif");
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") {
        return match &head[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }
    if head.starts_with(b"PK\x03\x04") {
        return Some("application/zip");
    }
    if head.starts_with(b"Rar!") {
        return Some("application/x-rar-compressed");
    }
    if head.starts_with(&[b'7', b'z', 0xbc, 0xaf, 0x27, 0x1c]) {
        return Some("application/x-7z-compressed");
    }
    if head.starts_with(&[0x1f, 0x8b]) {
        return Some("application/gzip");
    }
    if head.starts_with(&[0xd0, 0xcf, 0x11, 0xe0]) {
        return Some("application/x-ole-storage");
    }
    if head.starts_with(b"ID3") || head.starts_with(&[0xff, 0xfb]) {
        return Some("audio/mpeg");
    }
    if head.starts_with(b"OggS") {
        return Some("audio/ogg");
    }
    if head.starts_with(b"fLaC") {
        return Some("audio/flac");
    }
    if head.len() >= 8 && &head[4..8] == b"ftyp" {
        return Some("video/mp4");
    }
    if head.starts_with(&[0x1a, 0x45, 0xdf, 0xa3]) {
        return Some("video/webm");
    }
    None
}

/// Cross-check the sniffed content against the claimed extension.
///
/// Executable signatures are rejected outright. A recognized signature
/// must belong to the extension's family; an unrecognized signature passes,
/// since the extension and MIME checks have already run.
pub fn validate_content(filename: &str, head: &[u8]) -> Result<(), ValidationError> {
    let Some(sniffed) = sniff_content_type(head) else {
        return Ok(());
    };

    if EXECUTABLE_TYPES.contains(&sniffed) {
        return Err(ValidationError::ContentMismatch);
    }

    let extension = extension_of(filename);
    let extension = extension.as_str();

    let compatible = match sniffed {
        "application/zip" => ZIP_CONTAINER_EXTENSIONS.contains(&extension),
        "application/x-ole-storage" => OLE_CONTAINER_EXTENSIONS.contains(&extension),
        "video/mp4" => MP4_CONTAINER_EXTENSIONS.contains(&extension),
        "application/gzip" => extension == "gz",
        "application/x-rar-compressed" => extension == "rar",
        "application/x-7z-compressed" => extension == "7z",
        "application/pdf" => extension == "pdf",
        "image/png" => extension == "png",
        "image/jpeg" => extension == "jpg" || extension == "jpeg",
        "image/gif" => extension == "gif",
        "image/webp" => extension == "webp",
        "audio/mpeg" => extension == "mp3",
        "audio/wav" => extension == "wav",
        "audio/ogg" => extension == "ogg",
        "audio/flac" => extension == "flac",
        "video/x-msvideo" => extension == "avi",
        "video/webm" => extension == "webm",
        _ => true,
    };

    if compatible {
        Ok(())
    } else {
        Err(ValidationError::ContentMismatch)
    }
}
