//! Shared fixture catalog for decoder integration tests
//!
//! A small vPIC-shaped catalog: Ford trucks (with the F-150/F-550 schema
//! pair whose model patterns tie on weight and specificity), a Honda CR-V
//! schema, and a BMW X1 schema. Tesla's LRW WMI arrives only through the
//! community overlay document.

// Each integration binary uses its own slice of this module
#![allow(dead_code)]

use std::sync::Arc;

use vin_core_domain::{CatalogSource, Decoder};
use vin_core_models::{DecoderConfig, LookupTable, PatternSource};
use vin_core_storage::{compose, CatalogStore, MemoryCatalog, MemoryCatalogBuilder};

/// Pinned "now" so the model-year future guard is stable
pub const NOW_YEAR: i32 = 2025;

pub const OVERLAY_YAML: &str = r#"
name: tesla-giga-shanghai
wmis:
  - code: LRW
    manufacturer: Tesla Shanghai Co., Ltd.
    make: Tesla
    country: China
    vehicle_type: Passenger Car
schemas:
  - name: Tesla Model Y (Giga Shanghai)
    wmi: LRW
    year_from: 2021
    patterns:
      - { keys: "YG****", element: "Model", value: "Model Y" }
      - { keys: "YG****", element: "Body Class", value: "Sport Utility Vehicle (SUV)" }
      - { keys: "YG****", element: "Fuel Type - Primary", value: "Electric" }
      - { keys: "YG****", element: "Electrification Level", value: "BEV" }
      - { keys: "****E*", element: "Drive Type", value: "RWD" }
      - { keys: "****F*", element: "Drive Type", value: "AWD" }
      - { keys: "YG****", element: "Plant Country", value: "China" }
      - { keys: "YG****", element: "Plant City", value: "Shanghai" }
      - { keys: "YG****", element: "Doors", value: "5" }
"#;

#[allow(clippy::too_many_lines)]
pub fn fixture_catalog() -> MemoryCatalog {
    let mut b = MemoryCatalogBuilder::new();

    // Elements
    let make = b.element("Make", Some(LookupTable::Make), 99);
    let model = b.element("Model", Some(LookupTable::Model), 99);
    let body = b.element("Body Class", Some(LookupTable::BodyStyle), 80);
    let series = b.element("Series", None, 75);
    let drive = b.element("Drive Type", Some(LookupTable::DriveType), 70);
    let fuel = b.element("Fuel Type - Primary", Some(LookupTable::FuelType), 70);
    b.element("Electrification Level", Some(LookupTable::ElectrificationLevel), 65);
    let cylinders = b.element("Engine Number of Cylinders", None, 60);
    let displacement = b.element("Displacement (L)", None, 60);
    let engine_model = b.element("Engine Model", None, 55);
    let doors = b.element("Doors", None, 50);
    let plant_country = b.element("Plant Country", Some(LookupTable::Country), 40);
    let plant_city = b.element("Plant City", None, 40);

    // Dictionaries
    let ford = b.lookup_row(LookupTable::Make, "Ford");
    let honda = b.lookup_row(LookupTable::Make, "Honda");
    let bmw = b.lookup_row(LookupTable::Make, "BMW");
    let tesla = b.lookup_row(LookupTable::Make, "Tesla");

    let f150 = b.lookup_row(LookupTable::Model, "F-150");
    let f550 = b.lookup_row(LookupTable::Model, "F-550");
    let crv = b.lookup_row(LookupTable::Model, "CR-V");
    let x1 = b.lookup_row(LookupTable::Model, "X1");
    let model_y = b.lookup_row(LookupTable::Model, "Model Y");

    b.link_make_model(ford, f150);
    b.link_make_model(ford, f550);
    b.link_make_model(honda, crv);
    b.link_make_model(bmw, x1);
    b.link_make_model(tesla, model_y);

    let pickup = b.lookup_row(LookupTable::BodyStyle, "Pickup");
    let suv = b.lookup_row(LookupTable::BodyStyle, "Sport Utility Vehicle (SUV)");

    let gasoline = b.lookup_row(LookupTable::FuelType, "Gasoline");
    b.lookup_row(LookupTable::FuelType, "Electric");

    let four_wd = b.lookup_row(LookupTable::DriveType, "4WD");
    let awd = b.lookup_row(LookupTable::DriveType, "AWD");
    b.lookup_row(LookupTable::DriveType, "RWD");

    let usa = b.lookup_row(LookupTable::Country, "United States");
    let canada = b.lookup_row(LookupTable::Country, "Canada");
    let germany = b.lookup_row(LookupTable::Country, "Germany");
    b.lookup_row(LookupTable::Country, "China");

    let ford_mfr = b.lookup_row(LookupTable::Manufacturer, "Ford Motor Company, USA");
    let honda_mfr = b.lookup_row(LookupTable::Manufacturer, "Honda of Canada Mfg., Inc.");
    let bmw_mfr = b.lookup_row(LookupTable::Manufacturer, "BMW AG");

    let truck = b.lookup_row(LookupTable::VehicleType, "Truck");
    let mpv = b.lookup_row(LookupTable::VehicleType, "Multipurpose Passenger Vehicle (MPV)");
    b.lookup_row(LookupTable::VehicleType, "Passenger Car");

    // WMIs
    let ft = b.wmi("1FT", ford_mfr, Some(ford), Some(truck), Some(usa));
    b.link_wmi_make(ft, ford);
    let hk = b.wmi("2HK", honda_mfr, Some(honda), Some(mpv), Some(canada));
    b.link_wmi_make(hk, honda);
    let ba = b.wmi("WBA", bmw_mfr, Some(bmw), None, Some(germany));
    b.link_wmi_make(ba, bmw);

    // F-550 schema first: its model pattern takes the lower id, so only
    // schema coherence can hand the win to the F-150.
    let f550_schema = b.schema("Ford Truck F-550 (2020-)", "1FT");
    b.link_wmi_schema(ft, f550_schema, 2020, None);
    b.pattern(f550_schema, "FW****", model, &f550.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(f550_schema, "F*****", body, &pickup.to_string(), PatternSource::Official)
        .expect("pattern");

    let f150_schema = b.schema("Ford Truck F-150 (2021-)", "1FT");
    b.link_wmi_schema(ft, f150_schema, 2021, None);
    b.pattern(f150_schema, "******", make, &ford.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "FW****", model, &f150.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "FW5***", series, "XLT SuperCrew", PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "FW****", body, &pickup.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "FW5***", drive, &four_wd.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "******", fuel, &gasoline.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "***L**", cylinders, "6", PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "***L**", displacement, "3.5", PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "***L8*", engine_model, "3.5L V6 EcoBoost", PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "FW****", doors, "4", PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "******", plant_country, &usa.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(f150_schema, "******", plant_city, "Dearborn", PatternSource::Official)
        .expect("pattern");

    // Honda CR-V
    let crv_schema = b.schema("Honda CR-V (2017-)", "2HK");
    b.link_wmi_schema(hk, crv_schema, 2017, None);
    b.pattern(crv_schema, "******", make, &honda.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "RW****", model, &crv.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "RW****", body, &suv.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "RW2***", drive, &awd.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "******", fuel, &gasoline.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "***H**", cylinders, "4", PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "***H**", displacement, "1.5", PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "RW****", doors, "5", PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "******", plant_country, &canada.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(crv_schema, "******", plant_city, "Alliston", PatternSource::Official)
        .expect("pattern");

    // BMW X1 (E84)
    let x1_schema = b.schema("BMW X1 (2012-2016)", "WBA");
    b.link_wmi_schema(ba, x1_schema, 2012, Some(2016));
    b.pattern(x1_schema, "******", make, &bmw.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "VL****", model, &x1.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "VL****", body, &suv.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "VL1***", drive, &awd.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "******", fuel, &gasoline.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "***C**", cylinders, "4", PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "***C**", displacement, "2.0", PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "******", plant_country, &germany.to_string(), PatternSource::Official)
        .expect("pattern");
    b.pattern(x1_schema, "******", plant_city, "Leipzig", PatternSource::Official)
        .expect("pattern");

    b.build()
}

/// Decoder over the base fixture catalog
pub async fn base_decoder(config: DecoderConfig) -> Decoder {
    Decoder::open(CatalogSource::store(Arc::new(fixture_catalog())), config)
        .await
        .expect("open decoder")
        .with_now_year(NOW_YEAR)
}

/// Decoder over the fixture catalog with the Tesla overlay composed on top
pub async fn overlay_decoder(config: DecoderConfig) -> Decoder {
    let base: Arc<dyn CatalogStore> = Arc::new(fixture_catalog());
    let doc = serde_yaml::from_str(OVERLAY_YAML).expect("overlay parses");
    let layered = compose(base, &[doc]).await.expect("overlay composes");

    Decoder::open(CatalogSource::store(Arc::new(layered)), config)
        .await
        .expect("open decoder")
        .with_now_year(NOW_YEAR)
}
