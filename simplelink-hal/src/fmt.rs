#![allow(unused_macros)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("You may not enable both `defmt` and `log` features.");

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::defmt::trace!($s $(, $x)*)
            };
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::defmt::debug!($s $(, $x)*)
            };
        }
        macro_rules! info {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::defmt::info!($s $(, $x)*)
            };
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::defmt::warn!($s $(, $x)*)
            };
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::defmt::error!($s $(, $x)*)
            };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::log::trace!($s $(, $x)*)
            };
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::log::debug!($s $(, $x)*)
            };
        }
        macro_rules! info {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::log::info!($s $(, $x)*)
            };
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::log::warn!($s $(, $x)*)
            };
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => {
                ::log::error!($s $(, $x)*)
            };
        }
    } else {
        // No backend selected, so we just evaluate the arguments.
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                let _ = ($( & $x ),*);
            }};
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                let _ = ($( & $x ),*);
            }};
        }
        macro_rules! info {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                let _ = ($( & $x ),*);
            }};
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                let _ = ($( & $x ),*);
            }};
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => {{
                let _ = ($( & $x ),*);
            }};
        }
    }
}

/// Logs at debug level, but only if the driver was constructed with debugging enabled.
macro_rules! sl_debug {
    ($enabled:expr, $s:literal $(, $x:expr)* $(,)?) => {
        if $enabled {
            debug!($s $(, $x)*);
        }
    };
}
