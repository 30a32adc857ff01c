//! Prints TypeScript declarations for the typed master-data records.

use models::models::{
    category::Category, company::Company, farm::Farm, farmer_profile::FarmerProfile,
    machinery::Machinery, paddy_variety::PaddyVariety, poultry_house::PoultryHouse,
    ruminant_pen::RuminantPen, season::Season,
};
use ts_rs::TS;

fn main() {
    let decls = [
        Company::decl(),
        Farm::decl(),
        FarmerProfile::decl(),
        Category::decl(),
        Season::decl(),
        PaddyVariety::decl(),
        PoultryHouse::decl(),
        RuminantPen::decl(),
        Machinery::decl(),
    ];

    println!("// This file was generated by `generate-types`. Do not edit.\n");
    for decl in decls {
        println!("export {decl}\n");
    }
}
