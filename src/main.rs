#[tokio::main]
async fn main() {
    if let Err(e) = household_hub_lib::run().await {
        log::error!("サーバーの実行中にエラーが発生しました: {}", e.details());
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}
