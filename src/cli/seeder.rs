use std::time::Instant;

use bcrypt::hash;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use campusdesk_models::UserRole;

pub const SEED_PASSWORD: &str = "password123";
const SEED_EMAIL_DOMAIN: &str = "example.com";
const SEED_DEPARTMENT_NOTE: &str = "Seeded department";

const DEPARTMENTS: &[(&str, &str)] = &[
    ("Computer Science", "CSE"),
    ("Electrical Engineering", "EEE"),
    ("Mechanical Engineering", "MECH"),
    ("Civil Engineering", "CIVIL"),
    ("Mathematics", "MATH"),
    ("Physics", "PHY"),
    ("Business Administration", "BBA"),
    ("English Literature", "ENG"),
];

#[derive(Debug, Clone, Copy)]
pub struct SeedCounts {
    pub departments: usize,
    pub faculty: usize,
    pub students: usize,
}

impl Default for SeedCounts {
    fn default() -> Self {
        Self {
            departments: 4,
            faculty: 10,
            students: 100,
        }
    }
}

#[derive(Debug)]
pub struct UserSeed {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub department_id: Uuid,
    pub year: Option<i32>,
    pub semester: Option<i32>,
    pub phone: String,
}

/// Inserts departments, approved faculty and students. Every seeded account
/// shares [`SEED_PASSWORD`], hashed once at a low bcrypt cost.
pub async fn seed_database(db: &PgPool, counts: SeedCounts) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let departments = counts.departments.clamp(1, DEPARTMENTS.len());

    println!("🌱 Seeding database...");
    println!(
        "   - {} departments, {} faculty, {} students",
        departments, counts.faculty, counts.students
    );

    let department_ids = insert_departments(db, &DEPARTMENTS[..departments]).await?;
    println!("   ✓ {} departments ready", department_ids.len());

    let password_hash = hash(SEED_PASSWORD, 4)?;

    let gen_start = Instant::now();
    let users = generate_users(&department_ids, counts);
    println!("   ✓ Generated {} users in {:?}", users.len(), gen_start.elapsed());

    let insert_start = Instant::now();
    let inserted = insert_users(db, &users, &password_hash).await?;
    println!("   ✓ Inserted {} users in {:?}", inserted, insert_start.elapsed());

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());
    println!("📝 Password for all seeded users: {SEED_PASSWORD}");
    Ok(())
}

/// Existing departments with the same code are reused.
async fn insert_departments(db: &PgPool, departments: &[(&str, &str)]) -> anyhow::Result<Vec<Uuid>> {
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(departments.len());

    for (name, code) in departments {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO departments (name, code, description)
             VALUES ($1, $2, $3)
             ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
             RETURNING id",
        )
        .bind(name)
        .bind(code)
        .bind(SEED_DEPARTMENT_NOTE)
        .fetch_one(&mut *tx)
        .await?;
        ids.push(id);
    }

    tx.commit().await?;
    Ok(ids)
}

pub fn generate_users(department_ids: &[Uuid], counts: SeedCounts) -> Vec<UserSeed> {
    let specs: Vec<(UserRole, usize)> = (0..counts.faculty)
        .map(|i| (UserRole::Faculty, i))
        .chain((0..counts.students).map(|i| (UserRole::Student, i)))
        .collect();

    specs
        .into_par_iter()
        .map(|(role, idx)| generate_user(role, idx, department_ids[idx % department_ids.len()]))
        .collect()
}

fn generate_user(role: UserRole, idx: usize, department_id: Uuid) -> UserSeed {
    let first_name: String = FirstName().fake();
    let last_name: String = LastName().fake();

    let email = format!(
        "{}.{}+{}{}@{SEED_EMAIL_DOMAIN}",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        role,
        idx
    )
    .replace(['\'', ' '], "");

    let (year, semester) = match role {
        UserRole::Student => {
            let year: i32 = (1..5).fake();
            let semester = year * 2 - (1..3).fake::<i32>() + 1;
            (Some(year), Some(semester))
        }
        _ => (None, None),
    };

    let mut phone: String = PhoneNumber().fake();
    phone.truncate(30);

    UserSeed {
        name: format!("{first_name} {last_name}"),
        email,
        role,
        department_id,
        year,
        semester,
        phone,
    }
}

async fn insert_users(db: &PgPool, users: &[UserSeed], password_hash: &str) -> anyhow::Result<u64> {
    let mut tx = db.begin().await?;

    // 8 params per row, well under the 65535 bind limit
    const BATCH_SIZE: usize = 1000;
    let mut inserted = 0;

    for chunk in users.chunks(BATCH_SIZE) {
        inserted += insert_users_chunk(&mut tx, chunk, password_hash).await?;
    }

    tx.commit().await?;
    Ok(inserted)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
    password_hash: &str,
) -> anyhow::Result<u64> {
    if users.is_empty() {
        return Ok(0);
    }

    let mut query = String::from(
        "INSERT INTO users (name, email, password, role, department_id, year, semester, phone) VALUES ",
    );
    for i in 0..users.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 8;
        query.push_str(&format!(
            "(${}, ${}, ${}, ${}, ${}, ${}, ${}, ${})",
            p + 1,
            p + 2,
            p + 3,
            p + 4,
            p + 5,
            p + 6,
            p + 7,
            p + 8
        ));
    }
    query.push_str(" ON CONFLICT (email) DO NOTHING");

    let mut q = sqlx::query(&query);
    for user in users {
        q = q
            .bind(&user.name)
            .bind(&user.email)
            .bind(password_hash)
            .bind(user.role)
            .bind(user.department_id)
            .bind(user.year)
            .bind(user.semester)
            .bind(&user.phone);
    }

    Ok(q.execute(&mut **tx).await?.rows_affected())
}

/// Deletes seeded faculty and students, then seeded departments. Admins are kept.
pub async fn clear_seeded_data(db: &PgPool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;

    let users_deleted = sqlx::query("DELETE FROM users WHERE email LIKE $1 AND role <> 'admin'")
        .bind(format!("%@{SEED_EMAIL_DOMAIN}"))
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let departments_deleted = sqlx::query("DELETE FROM departments WHERE description = $1")
        .bind(SEED_DEPARTMENT_NOTE)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    println!(
        "   ✓ Deleted {} users and {} departments in {:?}",
        users_deleted,
        departments_deleted,
        start_time.elapsed()
    );
    Ok(())
}
