use proc_macro2::TokenStream;
use quote::quote;
use std::env;
use std::fs;
use std::path::Path;

// Note: These types are only used in build.rs for parsing the TOML file
// The actual types used in the crate are generated from this data

#[derive(Debug, serde::Deserialize)]
struct GranularityConfig {
    granularity: Vec<GranularityDef>,
}

#[derive(Debug, serde::Deserialize)]
struct GranularityDef {
    /// 對外的區間名稱，例如 "1minute"
    name: String,
    enum_name: String,
    minutes: u32,
    display_name: String,
}

fn main() {
    println!("cargo:rerun-if-changed=config/granularities.toml");

    // 讀取 granularities.toml
    let toml_content = fs::read_to_string("config/granularities.toml")
        .expect("Failed to read config/granularities.toml");

    let config: GranularityConfig =
        toml::from_str(&toml_content).expect("Failed to parse config/granularities.toml");

    // 生成粒度宏定義
    let granularities_macro = generate_granularities_macro(&config.granularity);

    // 寫入到輸出目錄
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("granularities_generated.rs");

    fs::write(&dest_path, granularities_macro.to_string())
        .expect("Failed to write generated granularity code");
}

fn generate_granularities_macro(granularities: &[GranularityDef]) -> TokenStream {
    // 為每個粒度生成 token
    let entries: Vec<TokenStream> = granularities
        .iter()
        .map(|g| {
            let enum_name = syn::Ident::new(&g.enum_name, proc_macro2::Span::call_site());
            let name = &g.name;
            let minutes = g.minutes;
            let display_name = &g.display_name;

            quote! {
                (#enum_name, #name, #minutes, #display_name)
            }
        })
        .collect();

    // 生成完整的宏定義
    quote! {
        /// 主粒度定義宏 - 包含所有K線粒度的元數據
        macro_rules! granularities {
            ($call:ident) => {
                $call! {
                    #(#entries),*
                }
            };
        }
    }
}
