use std::path::PathBuf;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{info, warn};
use serde::Deserialize;

use wordgen_core::io::{get_filename, list_files, normalize_folder};
use wordgen_core::{Alphabet, Error, LengthLimit, ModelFormat, WordGenerator};

/// Upper bound on `count` for one request.
const MAX_COUNT: usize = 1000;

/// Command line of the server.
#[derive(Parser, Debug)]
#[command(name = "wordgen-server")]
#[command(about = "Serves generated words over HTTP", long_about = None)]
#[command(version)]
struct Args {
	/// Address to listen on
	#[arg(long, default_value = "127.0.0.1:5000")]
	bind: String,

	/// Directory holding the `.dat` dictionaries
	#[arg(long, default_value = "./data")]
	data: String,

	/// Sample successors uniformly instead of by frequency
	#[arg(long)]
	unweighted: bool,

	/// The vowels of the served languages
	#[arg(long, default_value = "aeiou")]
	vowels: String,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	min: Option<usize>,
	max: Option<usize>,
	count: Option<usize>,
	tries: Option<usize>,
}

#[derive(Deserialize)]
struct ModelQuery {
	names: Option<String>,
}

/// Settings fixed at startup.
struct Settings {
	data_dir: PathBuf,
	alphabet: Alphabet,
	weighted: bool,
}

/// Everything behind the lock: the generator and the dictionaries merged
/// into it.
struct SharedData {
	generator: WordGenerator,
	model_names: Vec<String>,
}

impl GenerateParams {
	/// Builds the length window, defaulting to `(0, 14)`.
	fn limit(&self) -> Result<LengthLimit, String> {
		LengthLimit::range(self.min.unwrap_or(0), self.max.unwrap_or(14)).map_err(|e| e.to_string())
	}
}

/// Maps a core error onto an HTTP response.
fn error_response(err: Error) -> HttpResponse {
	match err {
		Error::Unseeded => HttpResponse::Conflict().body(err.to_string()),
		Error::Configuration(_) => HttpResponse::BadRequest().body(err.to_string()),
		Error::Resource { .. } => HttpResponse::NotFound().body(err.to_string()),
		Error::Format(_) | Error::Io(_) => HttpResponse::InternalServerError().body(err.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates `count` words within `(min, max)`, one per line. Each word gets
/// `tries` walks; fewer words are returned if they run out.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let limit = match query.limit() {
		Ok(limit) => limit,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};
	let count = query.count.unwrap_or(1);
	if count > MAX_COUNT {
		return HttpResponse::BadRequest().body(format!("count must be at most {}", MAX_COUNT));
	}
	let tries = query.tries.unwrap_or(1000).max(1);

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.generator.generate(limit, Some(count)) {
		Ok(words) => HttpResponse::Ok().body(words.with_max_attempts(tries).collect::<Vec<_>>().join("\n")),
		Err(e) => error_response(e),
	}
}

#[get("/v1/models")]
async fn get_models(settings: web::Data<Settings>) -> impl Responder {
	match list_files(&settings.data_dir, "dat") {
		Ok(files) => {
			let names: Vec<String> = files.iter().filter_map(|f| get_filename(f).ok()).collect();
			HttpResponse::Ok().body(names.join("\n"))
		}
		Err(_) => HttpResponse::InternalServerError().body("Failed to list models"),
	}
}

#[get("/v1/loaded_models")]
async fn get_loaded_models(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(shared_data.model_names.join("\n"))
}

/// HTTP PUT endpoint `/v1/load_models`
///
/// Replaces the served model with the merge of the named dictionaries. The
/// current model is kept if any of them fails to load.
#[put("/v1/load_models")]
async fn put_model(
	data: web::Data<Mutex<SharedData>>,
	settings: web::Data<Settings>,
	query: web::Query<ModelQuery>,
) -> impl Responder {
	let query_names = match &query.names {
		Some(s) if !s.trim().is_empty() => s.trim(),
		_ => return HttpResponse::BadRequest().body("Missing or empty model name"),
	};

	let model_names: Vec<&str> = query_names
		.split(',')
		.map(|s| s.trim())
		.filter(|s| !s.is_empty())
		.collect();
	if let Some(bad) = model_names.iter().find(|name| name.contains(['/', '\\']) || name.starts_with('.')) {
		return HttpResponse::BadRequest().body(format!("Invalid model name: {bad}"));
	}

	let mut generator = WordGenerator::new(settings.alphabet.clone(), settings.weighted);
	for name in &model_names {
		let model_path = settings.data_dir.join(format!("{}.dat", name));
		let partial = match WordGenerator::open(&model_path, settings.alphabet.clone(), settings.weighted) {
			Ok(g) => g,
			Err(e) => {
				warn!("Failed to load model {}: {}", name, e);
				return error_response(e);
			}
		};
		if let Err(e) = generator.merge(partial.model()) {
			return error_response(e);
		}
	}

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.generator = generator;
	shared_data.model_names = model_names.iter().map(|s| s.to_string()).collect();
	info!("Serving models: {}", shared_data.model_names.join(", "));

	HttpResponse::Ok().body("Models loaded successfully")
}

/// HTTP GET endpoint `/v1/model`: the served model as a JSON document.
#[get("/v1/model")]
async fn get_model(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut body = Vec::new();
	match shared_data.generator.save(&mut body, ModelFormat::Json) {
		Ok(()) => HttpResponse::Ok().content_type("application/json").body(body),
		Err(e) => error_response(e),
	}
}

/// Registers every endpoint.
fn routes(cfg: &mut web::ServiceConfig) {
	cfg.service(get_generated)
		.service(get_models)
		.service(put_model)
		.service(get_loaded_models)
		.service(get_model);
}

/// Main entry point for the server.
///
/// Starts with an unseeded generator wrapped in a `Mutex`; models are
/// loaded through `/v1/load_models`.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
	let args = Args::parse();

	let alphabet = Alphabet::new(args.vowels.chars(), wordgen_core::model::alphabet::MARKER)?;
	let settings = web::Data::new(Settings {
		data_dir: normalize_folder(&args.data),
		alphabet: alphabet.clone(),
		weighted: !args.unweighted,
	});
	let shared_model = web::Data::new(Mutex::new(SharedData {
		generator: WordGenerator::new(alphabet, !args.unweighted),
		model_names: Vec::new(),
	}));

	info!("Listening on {}, data in {}", args.bind, settings.data_dir.display());
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.app_data(settings.clone())
			.configure(routes)
	})
		.bind(&args.bind)?
		.run()
		.await?;

	Ok(())
}
