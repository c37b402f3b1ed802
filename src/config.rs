use confique::Config as DeriveConfig;
use jsontree::PrintOptions;

#[derive(Debug, DeriveConfig)]
pub struct Config {
    /// How matches are printed. `--pretty` and `--ascii` take precedence.
    #[config(nested)]
    pub print: PrintConfig,

    /// Deepest nesting of objects and arrays accepted in an input file.
    #[config(default = 512)]
    pub max_depth: usize,

    /// Give up on a file after expanding this many work items. Unlimited if unset.
    pub step_limit: Option<u64>,
}

#[derive(Debug, DeriveConfig)]
pub struct PrintConfig {
    #[config(default = false)]
    pub ascii_only: bool,
    #[config(default = false)]
    pub readable_spacing: bool,
    #[config(default = false)]
    pub array_line_breaks: bool,
    #[config(default = false)]
    pub object_line_breaks: bool,
    #[config(default = false)]
    pub leading_line_break: bool,
    #[config(default = false)]
    pub line_break_after_key: bool,
    #[config(default = 2)]
    pub indent: usize,
}

impl From<&PrintConfig> for PrintOptions {
    fn from(config: &PrintConfig) -> Self {
        PrintOptions {
            ascii_only: config.ascii_only,
            readable_spacing: config.readable_spacing,
            array_line_breaks: config.array_line_breaks,
            object_line_breaks: config.object_line_breaks,
            leading_line_break: config.leading_line_break,
            line_break_after_key: config.line_break_after_key,
            indent: config.indent,
        }
    }
}

#[cfg(test)]
mod tests {
    use confique::Config as _;

    use super::*;

    #[test]
    fn defaults_without_a_file() {
        let config = Config::builder().load().unwrap();
        assert_eq!(config.max_depth, 512);
        assert_eq!(config.step_limit, None);
        assert_eq!(
            PrintOptions::from(&config.print),
            PrintOptions {
                indent: 2,
                ..PrintOptions::default()
            }
        );
    }
}
