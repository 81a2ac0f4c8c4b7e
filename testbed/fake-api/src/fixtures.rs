use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub device_type: String,
    pub display_name: String,
    #[serde(default)]
    pub properties: DeviceProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_online")]
    pub online: bool,
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self {
            locked: false,
            online: default_online(),
        }
    }
}

fn default_online() -> bool {
    true
}

/// Initial data a fake API instance starts with. Every instance gets its own
/// copy, so mutations in one run never leak into another.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiFixture {
    #[serde(default)]
    pub devices: Vec<Device>,
}

impl ApiFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&mut self, device: Device) {
        self.devices.push(device);
    }

    pub fn get_device(&self, device_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    pub fn get_device_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| d.device_id == device_id)
    }

    pub fn from_yaml(yaml_content: &str) -> anyhow::Result<Self> {
        let fixture: ApiFixture = serde_yaml::from_str(yaml_content)?;
        Ok(fixture)
    }

    pub fn create_test_fixture() -> Self {
        let mut fixture = Self::new();

        fixture.add_device(Device {
            device_id: "august_lock_1".to_string(),
            device_type: "august_lock".to_string(),
            display_name: "Front Door".to_string(),
            properties: DeviceProperties {
                locked: false,
                online: true,
            },
        });
        fixture.add_device(Device {
            device_id: "schlage_lock_1".to_string(),
            device_type: "schlage_lock".to_string(),
            display_name: "Back Door".to_string(),
            properties: DeviceProperties {
                locked: true,
                online: true,
            },
        });
        fixture.add_device(Device {
            device_id: "ecobee_thermostat_1".to_string(),
            device_type: "ecobee_thermostat".to_string(),
            display_name: "Living Room".to_string(),
            properties: DeviceProperties::default(),
        });

        fixture
    }
}
