fn main() {
    let now = time::OffsetDateTime::now_utc();
    let stamp = |fmt: &str| {
        time::format_description::parse(fmt)
            .ok()
            .and_then(|desc| now.format(&desc).ok())
            .unwrap_or_else(|| "unknown".to_string())
    };

    let date = std::env::var("H5REST_BUILD_DATE")
        .unwrap_or_else(|_| stamp("[year]-[month]-[day]"));
    let time = std::env::var("H5REST_BUILD_TIME")
        .unwrap_or_else(|_| stamp("[hour]:[minute]"));

    println!("cargo:rerun-if-env-changed=H5REST_BUILD_DATE");
    println!("cargo:rerun-if-env-changed=H5REST_BUILD_TIME");
    println!("cargo:rustc-env=H5REST_BUILD_DATE={}", date);
    println!("cargo:rustc-env=H5REST_BUILD_TIME={}", time);
}
