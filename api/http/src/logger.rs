pub fn logger_format() -> &'static str {
    "%a \"%r\" %s %b %Dms"
}
