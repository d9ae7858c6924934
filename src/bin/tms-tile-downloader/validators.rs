use tms_tile_downloader::MAX_ZOOM;

pub fn zoom_level(v: &str) -> Result<u8, String> {
    let val = v.parse::<u8>().map_err(|_| "must be numeric".to_owned())?;

    if val > MAX_ZOOM {
        return Err(format!("must be <= {}", MAX_ZOOM));
    }

    Ok(val)
}

pub fn tile_index(v: &str) -> Result<u32, String> {
    v.parse::<u32>()
        .map_err(|_| "must be a non-negative integer".to_owned())
}

pub fn tile_url(v: &str) -> Result<String, String> {
    let lower = v.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err("must start with http:// or https://".to_owned());
    }

    for placeholder in ["{x}", "{y}", "{z}"] {
        if !v.contains(placeholder) {
            return Err(format!("must contain {}", placeholder));
        }
    }

    Ok(v.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_levels() {
        assert_eq!(zoom_level("0"), Ok(0));
        assert_eq!(zoom_level("30"), Ok(30));
        assert!(zoom_level("31").is_err());
        assert!(zoom_level("-1").is_err());
    }

    #[test]
    fn urls() {
        assert!(tile_url("HTTPS://a/{z}/{x}/{y}.png").is_ok());
        assert!(tile_url("https://a/{z}/{x}.png").is_err());
        assert!(tile_url("file:///{z}/{x}/{y}.png").is_err());
    }
}
