//! Device identity.
//!
//! The ingest API keys readings by device id, derived from the station MAC
//! so it is stable across reboots and unique per unit.

use log::info;

#[cfg(target_os = "espidf")]
fn read_mac() -> [u8; 6] {
    use esp_idf_svc::sys::*;
    let mut mac = [0u8; 6];
    // SAFETY: esp_read_mac writes exactly 6 bytes for the WIFI_STA type.
    unsafe {
        esp_read_mac(mac.as_mut_ptr(), esp_mac_type_t_ESP_MAC_WIFI_STA);
    }
    mac
}

#[cfg(not(target_os = "espidf"))]
fn read_mac() -> [u8; 6] {
    // Fixed simulation MAC.
    [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]
}

/// `esp32-` plus the six station MAC bytes, uppercase hex.
pub fn device_id() -> String {
    let mac = read_mac();
    let id = format!(
        "esp32-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    info!("device id: {id}");
    id
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn id_format_is_stable() {
        assert_eq!(device_id(), "esp32-AABBCCDDEEFF");
    }
}
