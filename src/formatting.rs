/// Tamaño en unidades binarias con coma decimal (`1,5 MiB (1.572.864 bytes)`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} bytes");
    }

    let (value, unit) = UNITS[1..]
        .iter()
        .fold((bytes as f64 / 1024.0, UNITS[0]), |(value, unit), next| {
            if value >= 1024.0 {
                (value / 1024.0, *next)
            } else {
                (value, unit)
            }
        });

    let value = format!("{value:.1}").replace('.', ",");
    format!("{value} {unit} ({} bytes)", format_count(bytes))
}

/// Entero con separador de miles (`1.234.567`).
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    grouped
}
