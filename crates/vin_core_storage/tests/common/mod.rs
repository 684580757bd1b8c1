//! Shared SQLite fixtures: the canonical catalog table layout plus a small
//! Ford truck dataset.

// Each integration binary uses its own slice of this module
#![allow(dead_code)]

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub const DDL: &[&str] = &[
    "CREATE TABLE Wmi (
        Id INTEGER PRIMARY KEY,
        Wmi TEXT NOT NULL,
        ManufacturerId INTEGER NOT NULL,
        MakeId INTEGER,
        VehicleTypeId INTEGER,
        CountryId INTEGER
    )",
    "CREATE TABLE Wmi_Make (WmiId INTEGER NOT NULL, MakeId INTEGER NOT NULL)",
    "CREATE TABLE VinSchema (
        Id INTEGER PRIMARY KEY,
        Name TEXT NOT NULL,
        sourcewmi TEXT,
        Notes TEXT
    )",
    "CREATE TABLE Wmi_VinSchema (
        Id INTEGER PRIMARY KEY,
        WmiId INTEGER NOT NULL,
        VinSchemaId INTEGER NOT NULL,
        YearFrom INTEGER NOT NULL,
        YearTo INTEGER
    )",
    "CREATE TABLE Pattern (
        Id INTEGER PRIMARY KEY,
        VinSchemaId INTEGER NOT NULL,
        Keys TEXT NOT NULL,
        ElementId INTEGER NOT NULL,
        AttributeId TEXT NOT NULL
    )",
    "CREATE TABLE Element (
        Id INTEGER PRIMARY KEY,
        Name TEXT NOT NULL,
        LookupTable TEXT,
        Weight INTEGER NOT NULL
    )",
    "CREATE TABLE Make (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE Model (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE Make_Model (MakeId INTEGER NOT NULL, ModelId INTEGER NOT NULL)",
    "CREATE TABLE BodyStyle (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE FuelType (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE DriveType (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE ElectrificationLevel (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE Transmission (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE Country (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE Manufacturer (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE VehicleType (Id INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
];

pub const SEED: &[&str] = &[
    "INSERT INTO Element VALUES (26, 'Make', 'Make', 99)",
    "INSERT INTO Element VALUES (28, 'Model', 'Model', 99)",
    "INSERT INTO Element VALUES (5, 'Body Class', 'BodyStyle', 80)",
    "INSERT INTO Element VALUES (34, 'Series', NULL, 75)",
    "INSERT INTO Make VALUES (460, 'Ford')",
    "INSERT INTO Model VALUES (1801, 'F-150')",
    "INSERT INTO Model VALUES (1805, 'F-550')",
    "INSERT INTO Make_Model VALUES (460, 1801)",
    "INSERT INTO Make_Model VALUES (460, 1805)",
    "INSERT INTO BodyStyle VALUES (7, 'Pickup')",
    "INSERT INTO Country VALUES (6, 'United States')",
    "INSERT INTO Manufacturer VALUES (976, 'Ford Motor Company, USA')",
    "INSERT INTO VehicleType VALUES (3, 'Truck')",
    "INSERT INTO Wmi VALUES (1, '1FT', 976, 460, 3, 6)",
    "INSERT INTO Wmi_Make VALUES (1, 460)",
    "INSERT INTO VinSchema VALUES (101, 'Ford Truck F-150', '1FT', NULL)",
    "INSERT INTO VinSchema VALUES (102, 'Ford Truck F-550', '1FT', 'Super Duty')",
    "INSERT INTO Wmi_VinSchema VALUES (1, 1, 101, 2021, NULL)",
    "INSERT INTO Wmi_VinSchema VALUES (2, 1, 102, 2020, NULL)",
    "INSERT INTO Pattern VALUES (1001, 101, 'FW****', 28, '1801')",
    "INSERT INTO Pattern VALUES (1002, 101, 'FW****', 5, '7')",
    "INSERT INTO Pattern VALUES (1003, 101, 'FW5***', 34, 'XLT')",
    "INSERT INTO Pattern VALUES (2001, 102, 'FW****', 28, '1805')",
];

/// One-connection in-memory pool; a fresh private database per test
pub async fn empty_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory pool")
}

/// Pool with the catalog tables created and the Ford dataset inserted
pub async fn seeded_pool() -> SqlitePool {
    let pool = empty_pool().await;
    for statement in DDL.iter().chain(SEED) {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("seed statement");
    }
    pool
}
