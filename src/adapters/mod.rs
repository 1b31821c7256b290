//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                  |
//! |-------------|-----------------|------------------------------|
//! | `hardware`  | SensorPort      | DHT22 sensors                |
//! |             | ActuatorPort    | fan relay, RGB status LED    |
//! |             | DisplayPort     | 16×2 I²C LCD                 |
//! | `log_sink`  | EventSink       | serial log output            |
//! | `nvs`       | ConfigPort      | NVS / in-memory store        |
//! | `csv_store` | LogStoragePort  | SPIFFS / host file system    |
//! | `time`      | ClockPort       | system clock + UTC offset    |
//! | `system`    | SystemPort      | FreeRTOS delay, `esp_restart`|

pub mod csv_store;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod system;
pub mod time;
