// Maps file extensions (lowercase) to fenced-code-block languages and to
// MIME types for the binary file marker.
use std::path::Path;

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

pub fn language_for_path(path: &Path) -> &'static str {
    match lowercase_extension(path).as_deref() {
        Some("py") => "python",
        Some("sh") => "bash",
        Some("js") => "javascript",
        Some("json") => "json",
        Some("svelte") => "svelte",
        Some("html") => "html",
        Some("css") => "css",
        Some("md") => "markdown",
        Some("txt") => "text",
        Some("yml" | "yaml") => "yaml",
        Some("xml") => "xml",
        Some("csv") => "csv",
        Some("ts") => "typescript",
        Some("sql") => "sql",
        Some("java") => "java",
        Some("c" | "h") => "c",
        Some("cpp" | "hpp") => "cpp",
        Some("cs") => "csharp",
        Some("php") => "php",
        Some("rb") => "ruby",
        Some("go") => "go",
        Some("rs") => "rust",
        Some("toml") => "toml",
        Some("kt") => "kotlin",
        Some("swift") => "swift",
        Some("m") => "objectivec",
        Some("pl") => "perl",
        Some("r") => "r",
        Some("lua") => "lua",
        Some("ps1" | "psm1" | "psd1" | "ps1xml" | "pssc" | "psrc") => "powershell",
        Some("bat" | "cmd") => "batch",
        Some("gd" | "tscn") => "gdscript",
        _ => "text",
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let mime = match lowercase_extension(path)?.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "mp3" => "audio/mpeg",
        "wav" => "audio/x-wav",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "exe" | "dll" | "so" | "bin" => "application/octet-stream",
        _ => return None,
    };
    Some(mime)
}
