// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand

    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! join {
    // Concatenate anything that derefs to &str into one String
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

/// Report a status line through an optional progress sink.
#[macro_export]
macro_rules! status {
    ($progress:expr, $($arg:tt)*) => {
        if let Some(p) = $progress.as_deref_mut() {
            p.log(&format!($($arg)*));
        }
    };
}
