use miette::Result;
use npmrc_login::NpmrcLogin;

#[async_std::main]
async fn main() -> Result<()> {
    NpmrcLogin::load().await
}
