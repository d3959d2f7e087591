/// 將一行 CSV 切成欄位
///
/// 每遇到 `"` 就切換引號狀態，引號本身不保留；只有在引號外的 `,` 才是分隔符。
/// 每個欄位關閉後去除前後空白，行尾不論是否有分隔符都會輸出最後一欄。
/// 引號不成對時不報錯，剩餘內容全部視為引號內文字。
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    fields.push(current.trim().to_string());
    fields
}
