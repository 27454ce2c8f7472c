use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem};

/// Remove surrounding quotes from configuration strings.
pub trait Unquote
where
    Self: Sized,
{
    fn unquote(self) -> Result<StringItem, ConfigError>;
}

impl Unquote for Result<StringItem, ConfigError> {
    /// Strips one pair of surrounding quotes, double or single, from every
    /// configuration value after trimming whitespace. Values without quotes
    /// pass through unchanged, so paths containing spaces can be quoted in the
    /// config file while plain values stay as-is.
    ///
    /// ## Example
    ///
    /// ```rust
    /// # use justconfig::Config;
    /// # use justconfig::ConfPath;
    /// # use justconfig::item::ValueExtractor;
    /// # use justconfig::sources::defaults::Defaults;
    /// # use reelknn::config_processors::Unquote;
    /// #
    /// # let mut conf = Config::default();
    /// # let mut defaults = Defaults::default();
    /// defaults.set(conf.root().push_all(&["model_path"]), "\"data/model.bin\"", "source info");
    /// conf.add_source(defaults);
    ///
    /// let value: String = conf.get(ConfPath::from(&["model_path"])).unquote().value().unwrap();
    ///
    /// assert_eq!(value, "data/model.bin");
    /// ```
    fn unquote(self) -> Result<StringItem, ConfigError> {
        self?.map(|v| {
            let v = v.trim();

            let quoted = (v.starts_with('"') && v.ends_with('"'))
                || (v.starts_with('\'') && v.ends_with('\''));
            if quoted && v.len() >= 2 {
                MapAction::Replace(vec![v[1..v.len() - 1].to_owned()])
            } else {
                MapAction::Keep
            }
        })
    }
}
