pub mod binance;
pub mod csv_feed;
pub mod yahoo;

pub use binance::BinanceMarketDataService;
pub use csv_feed::CsvMarketDataService;
pub use yahoo::YahooMarketDataService;
