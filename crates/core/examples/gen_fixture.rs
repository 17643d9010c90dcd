//! initDataテストフィクスチャ生成ツール
//!
//! 指定したボットトークンで署名したinitDataサンプルを生成する。
//!
//! 使い方:
//!   TELEGRAM_BOT_TOKEN=<token> cargo run --example gen_fixture -- <output_dir>
//!
//! 生成されるファイル:
//!   - valid/characterset.txt: 非ASCIIの名前を含むuser
//!   - valid/photo_url.txt: `\/` エスケープを含むphoto_urlとチャット情報
//!   - invalid/tampered_user.txt: userを書き換えたもの
//!   - invalid/tampered_auth_date.txt: auth_dateを書き換えたもの
//!   - invalid/missing_hash.txt: hashなし
//!   - invalid/zero_hash.txt: 全ゼロのhash
//!   - invalid/truncated_hash.txt: 前半32文字のみのhash

use std::fs;
use std::path::{Path, PathBuf};

const CHARACTERSET_USER: &str = r#"{"id":78787878,"first_name":"キャラクターセット","last_name":"last-name","username":"characterset","language_code":"ja","allows_write_to_pm":true}"#;

const PHOTO_URL_USER: &str = r#"{"id":78787878,"first_name":"キャラクターセット","last_name":"last-name","username":"characterset","language_code":"ja","is_premium":true,"allows_write_to_pm":true,"photo_url":"https:\/\/t.me\/i\/userpic\/320\/characterset.svg"}"#;

fn write(dir: &Path, name: &str, content: &str) {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("{content}\n")).unwrap();
    println!("  {}", path.display());
}

fn main() {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/samples/initData"));
    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN が未設定です");

    let valid_dir = output_dir.join("valid");
    let invalid_dir = output_dir.join("invalid");

    let characterset_fields = [
        ("query_id", "AAHdF6IQAAAAAN0XohDhrOrc"),
        ("user", CHARACTERSET_USER),
        ("auth_date", "1716239022"),
    ];
    let characterset = initdata_core::sign(&characterset_fields, &bot_token).unwrap();

    let photo_url = initdata_core::sign(
        &[
            ("user", PHOTO_URL_USER),
            ("chat_instance", "-7018392817161939413"),
            ("chat_type", "private"),
            ("start_param", "ref_42"),
            ("auth_date", "1716239515"),
        ],
        &bot_token,
    )
    .unwrap();

    let hash = initdata_core::parse(&characterset)
        .unwrap()
        .hash()
        .unwrap()
        .to_string();
    let zero_hash = "0".repeat(64);

    println!("フィクスチャを生成します:");
    write(&valid_dir, "characterset.txt", &characterset);
    write(&valid_dir, "photo_url.txt", &photo_url);
    write(
        &invalid_dir,
        "tampered_user.txt",
        &characterset.replace("last-name", "last-nane"),
    );
    write(
        &invalid_dir,
        "tampered_auth_date.txt",
        &characterset.replace("1716239022", "1716239023"),
    );
    write(&invalid_dir, "missing_hash.txt", &initdata_core::encode_pairs(&characterset_fields));

    let mut with_zero: Vec<(&str, &str)> = characterset_fields.to_vec();
    with_zero.push(("hash", &zero_hash));
    write(&invalid_dir, "zero_hash.txt", &initdata_core::encode_pairs(&with_zero));

    let mut with_truncated: Vec<(&str, &str)> = characterset_fields.to_vec();
    with_truncated.push(("hash", &hash[..32]));
    write(&invalid_dir, "truncated_hash.txt", &initdata_core::encode_pairs(&with_truncated));
}
