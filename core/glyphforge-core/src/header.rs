//! C header declaring the generated `lv_font_t` symbols

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::profile::Profile;

/// Symbol name the rasterizer gives a font written to `output`: the file stem.
pub fn symbol_for(output: &Path) -> Option<String> {
    output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

/// Include guard derived from a header path (`lv_font_zpix.h` → `LV_FONT_ZPIX_H`).
pub fn guard_for(header: &Path) -> String {
    let name = header
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fonts.h".to_string());
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub fn render_header(guard: &str, symbols: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#ifndef {guard}");
    let _ = writeln!(out, "#define {guard}");
    out.push_str("\n#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n#include \"lvgl.h\"\n\n");
    for symbol in symbols {
        let _ = writeln!(out, "extern const lv_font_t {symbol};");
    }
    out.push_str("\n#ifdef __cplusplus\n}\n#endif\n\n");
    let _ = writeln!(out, "#endif /* {guard} */");
    out
}

/// Header path (resolved) and contents for a profile's configured sizes.
pub fn profile_header(profile: &Profile) -> Option<(PathBuf, String)> {
    let header = profile.header.as_ref()?;
    let symbols: Vec<String> = profile
        .outputs
        .iter()
        .filter_map(|o| symbol_for(&o.path))
        .collect();
    Some((
        profile.base_dir().join(&header.path),
        render_header(&header.guard(), &symbols),
    ))
}
