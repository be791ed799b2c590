// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Fixture trees shaped like the published dataset.

#![allow(dead_code)]

use pulse::Category;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

pub const STATES: [&str; 3] = ["karnataka", "andaman-&-nicobar-islands", "pondicherry"];
pub const YEARS: [i32; 2] = [2022, 2023];

pub fn write_doc(root: &Path, category: Category, state: &str, year: i32, quarter: i32, doc: &Value) {
    write_raw(
        root,
        category,
        &format!("{state}/{year}/{quarter}.json"),
        &doc.to_string(),
    );
}

pub fn write_raw(root: &Path, category: Category, rel: &str, body: &str) -> PathBuf {
    let path = category.state_root(root).join(rel);
    fs::create_dir_all(path.parent().expect("fixture path has a parent")).expect("create fixture dir");
    fs::write(&path, body).expect("write fixture");
    path
}

/// Two categories with two instruments each: 4 rows per document.
pub fn transaction_doc(scale: f64) -> Value {
    json!({
        "success": true,
        "data": {
            "from": 1, "to": 2,
            "transactionData": [
                {"name": "Recharge & bill payments", "paymentInstruments": [
                    {"type": "TOTAL", "count": 100, "amount": 1000.0 * scale},
                    {"type": "CARD", "count": 5, "amount": 50.0 * scale}
                ]},
                {"name": "Peer-to-peer payments", "paymentInstruments": [
                    {"type": "TOTAL", "count": 40, "amount": 4000.0 * scale},
                    {"type": "UPI"}
                ]}
            ]
        }
    })
}

/// Two insurance categories with a TOTAL each, plus a non-TOTAL instrument.
pub fn insurance_doc(scale: f64) -> Value {
    json!({
        "data": {
            "transactionData": [
                {"name": "Motor", "paymentInstruments": [
                    {"type": "CARD", "count": 1, "amount": 10.0},
                    {"type": "TOTAL", "count": 20, "amount": 200.0 * scale}
                ]},
                {"name": "Health", "paymentInstruments": [
                    {"type": "TOTAL", "count": 3, "amount": 30.0 * scale}
                ]}
            ]
        }
    })
}

/// Two device brands plus the aggregated totals: 3 rows per document.
pub fn user_doc(registered: i64) -> Value {
    json!({
        "data": {
            "aggregated": {"registeredUsers": registered, "appOpens": registered * 3},
            "usersByDevice": [
                {"brand": "Xiaomi", "count": registered / 2, "percentage": 0.5},
                {"brand": "Apple", "count": registered / 4, "percentage": 0.25}
            ]
        }
    })
}

/// Two districts and one pincode: 3 rows per document.
pub fn top_transaction_doc(scale: f64) -> Value {
    json!({
        "data": {
            "states": null,
            "districts": [
                {"entityName": "bengaluru urban", "metric": {"type": "TOTAL", "count": 90, "amount": 900.0 * scale}},
                {"entityName": "mysuru", "metric": {"type": "TOTAL", "count": 10, "amount": 100.0 * scale}}
            ],
            "pincodes": [
                {"entityName": "560001", "metric": {"type": "TOTAL", "count": 7, "amount": 70.0 * scale}}
            ]
        }
    })
}

/// Two districts: 2 rows per document.
pub fn map_user_doc(registered: i64) -> Value {
    json!({
        "data": {
            "hoverData": {
                "bengaluru urban district": {"registeredUsers": registered, "appOpens": registered * 2},
                "mysuru district": {"registeredUsers": registered / 10, "appOpens": 0}
            }
        }
    })
}

/// Every category for every state, year and quarter.
pub fn write_full_tree(root: &Path) -> usize {
    let mut files = 0;
    for (s, state) in STATES.iter().enumerate() {
        for year in YEARS {
            for quarter in 1..=4 {
                let scale = (s + 1) as f64 * f64::from(year - 2020) + f64::from(quarter);
                let users = 1000 * (s as i64 + 1) + i64::from(quarter);
                write_doc(root, Category::Transaction, state, year, quarter, &transaction_doc(scale));
                write_doc(root, Category::Insurance, state, year, quarter, &insurance_doc(scale));
                write_doc(root, Category::User, state, year, quarter, &user_doc(users));
                write_doc(root, Category::TopTransaction, state, year, quarter, &top_transaction_doc(scale));
                write_doc(root, Category::MapUser, state, year, quarter, &map_user_doc(users));
                files += 1;
            }
        }
    }
    files
}
