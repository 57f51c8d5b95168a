pub struct DefaultsConfig {
    pub force_field: String,
    pub water_model: String,
    pub water_distance: f64,
    pub solvate: bool,
    pub out_name: String,
    pub temperature: f64,
    pub production_length_ns: f64,
    pub coord_dump_freq: u64,
    pub overwrite: bool,
    pub force_user_libraries: bool,
    pub search_local_libraries: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            force_field: "leaprc.protein.ff15ipq".to_string(),
            water_model: "leaprc.water.tip3p".to_string(),
            water_distance: 12.0,
            solvate: true,
            out_name: "complex".to_string(),
            temperature: 300.0,
            production_length_ns: 100.0,
            coord_dump_freq: 5000,
            overwrite: true,
            force_user_libraries: true,
            search_local_libraries: true,
        }
    }
}
